mod file;
mod s3;

pub use file::FileStore;
pub use s3::S3Store;

use crate::error::Result;

/// Encrypted root token.
pub const ROOT_TOKEN_BLOB: &str = "root-token.json.enc";
/// Encrypted, base64-encoded init response.
pub const UNSEAL_KEYS_BLOB: &str = "unseal-keys.json.enc";

/// Durable storage for named encrypted blobs.
#[async_trait::async_trait]
pub trait BlobStore {
    async fn put(&self, bucket: &str, name: &str, data: &[u8]) -> Result<()>;

    async fn get(&self, bucket: &str, name: &str) -> Result<Vec<u8>>;
}

/// The backend selected at startup.
pub enum EscrowStore {
    S3(S3Store),
    File(FileStore),
}

#[async_trait::async_trait]
impl BlobStore for EscrowStore {
    async fn put(&self, bucket: &str, name: &str, data: &[u8]) -> Result<()> {
        match self {
            EscrowStore::S3(store) => store.put(bucket, name, data).await,
            EscrowStore::File(store) => store.put(bucket, name, data).await,
        }
    }

    async fn get(&self, bucket: &str, name: &str) -> Result<Vec<u8>> {
        match self {
            EscrowStore::S3(store) => store.get(bucket, name).await,
            EscrowStore::File(store) => store.get(bucket, name).await,
        }
    }
}

use std::path::PathBuf;

use tracing::debug;

use super::BlobStore;
use crate::error::Error;
use crate::error::EscrowOp;
use crate::error::Result;

/// Stores blobs as `<root>/<bucket>/<name>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileStore {
    pub root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, bucket: &str, name: &str) -> PathBuf {
        self.root.join(bucket).join(name)
    }
}

#[async_trait::async_trait]
impl BlobStore for FileStore {
    async fn put(&self, bucket: &str, name: &str, data: &[u8]) -> Result<()> {
        let path = self.path(bucket, name);
        debug!(escrow = "file", path = %path.display(), "Writing blob");
        tokio::fs::create_dir_all(self.root.join(bucket))
            .await
            .map_err(|err| Error::escrow(EscrowOp::Put, name, err))?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|err| Error::escrow(EscrowOp::Put, name, err))?;
        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.path(bucket, name);
        debug!(escrow = "file", path = %path.display(), "Reading blob");
        tokio::fs::read(&path)
            .await
            .map_err(|err| Error::escrow(EscrowOp::Get, name, err))
    }
}

use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;

/// Envelope encryption under a managed key. Raw key material never reaches
/// this process.
#[async_trait::async_trait]
pub trait EnvelopeCrypto {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// The key is identified by metadata carried inside the ciphertext.
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

pub struct KmsCrypto {
    client: aws_sdk_kms::Client,
}

impl KmsCrypto {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_kms::Client::new(sdk_config),
        }
    }
}

#[async_trait::async_trait]
impl EnvelopeCrypto for KmsCrypto {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        debug!(crypto = "kms", key_id, "Encrypting payload");
        let output = self
            .client
            .encrypt()
            .key_id(key_id)
            .plaintext(Blob::new(plaintext))
            .send()
            .await
            .map_err(|err| Error::Crypto(DisplayErrorContext(err).to_string()))?;

        let blob = output
            .ciphertext_blob()
            .ok_or_else(|| Error::Crypto("KMS returned no ciphertext".to_owned()))?;

        Ok(blob.as_ref().to_vec())
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        debug!(crypto = "kms", "Decrypting payload");
        let output = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext))
            .send()
            .await
            .map_err(|err| Error::Crypto(DisplayErrorContext(err).to_string()))?;

        let blob = output
            .plaintext()
            .ok_or_else(|| Error::Crypto("KMS returned no plaintext".to_owned()))?;

        Ok(blob.as_ref().to_vec())
    }
}

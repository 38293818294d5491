use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use super::BlobStore;
use crate::error::Error;
use crate::error::EscrowOp;
use crate::error::Result;

pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for S3Store {
    async fn put(&self, bucket: &str, name: &str, data: &[u8]) -> Result<()> {
        debug!(escrow = "s3", "Writing blob to s3://{bucket}/{name}");
        self.client
            .put_object()
            .bucket(bucket)
            .key(name)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|err| Error::escrow(EscrowOp::Put, name, DisplayErrorContext(err)))?;
        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> Result<Vec<u8>> {
        debug!(escrow = "s3", "Reading blob from s3://{bucket}/{name}");
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
            .map_err(|err| Error::escrow(EscrowOp::Get, name, DisplayErrorContext(err)))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|err| Error::escrow(EscrowOp::Get, name, err))?;

        Ok(data.into_bytes().to_vec())
    }
}

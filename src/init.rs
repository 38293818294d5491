use data_encoding::BASE64;
use tracing::error;
use tracing::info;

use crate::config::Config;
use crate::crypto::EnvelopeCrypto;
use crate::error::Result;
use crate::escrow::BlobStore;
use crate::escrow::ROOT_TOKEN_BLOB;
use crate::escrow::UNSEAL_KEYS_BLOB;
use crate::vault::models::sys::init::PutInitRequest;
use crate::vault::VaultApi;

/// Per-blob outcome of escrowing the init material. The two writes are
/// independent, so one may fail while the other lands.
#[derive(Debug)]
pub struct InitReport {
    pub root_token: Result<()>,
    pub unseal_keys: Result<()>,
}

impl InitReport {
    pub fn is_complete(&self) -> bool {
        self.root_token.is_ok() && self.unseal_keys.is_ok()
    }
}

/// Initializes Vault and escrows what it hands back.
///
/// Errors are returned only for steps that leave nothing to escrow (the init
/// request itself or encryption). Blob writes are reported in [`InitReport`].
/// Nothing is rolled back.
pub async fn initialize<V, C, S>(
    config: &Config,
    vault: &V,
    crypto: &C,
    store: &S,
) -> Result<InitReport>
where
    V: VaultApi + ?Sized,
    C: EnvelopeCrypto + ?Sized,
    S: BlobStore + ?Sized,
{
    info!(
        phase = "init",
        shares = config.secret_shares,
        threshold = config.secret_threshold,
        "Performing initialization"
    );
    let request = PutInitRequest::from(config);
    let payload = vault.start_init(&request).await.map_err(|err| {
        error!(phase = "init", error = %err, "Failed performing initialization");
        err
    })?;
    info!(phase = "init", "Successfully initialized Vault");

    info!(phase = "init", "Encrypting unseal keys and the root token");
    let root_token = crypto
        .encrypt(&config.kms_key_id, payload.response.root_token.as_bytes())
        .await
        .map_err(|err| {
            error!(phase = "init", error = %err, "Failed encrypting root token");
            err
        })?;

    // The whole response body is escrowed, not just the key list.
    let encoded = BASE64.encode(&payload.body);
    let unseal_keys = crypto
        .encrypt(&config.kms_key_id, encoded.as_bytes())
        .await
        .map_err(|err| {
            error!(phase = "init", error = %err, "Failed encrypting unseal keys");
            err
        })?;
    drop(payload);

    let report = InitReport {
        root_token: put_blob(config, store, ROOT_TOKEN_BLOB, &root_token).await,
        unseal_keys: put_blob(config, store, UNSEAL_KEYS_BLOB, &unseal_keys).await,
    };
    info!(
        phase = "init",
        complete = report.is_complete(),
        "Initialization complete"
    );

    Ok(report)
}

async fn put_blob<S>(config: &Config, store: &S, name: &str, data: &[u8]) -> Result<()>
where
    S: BlobStore + ?Sized,
{
    let bucket = &config.bucket;
    match store.put(bucket, name, data).await {
        Ok(()) => {
            info!(phase = "init", bucket = %bucket, name, "Wrote escrow blob");
            Ok(())
        }
        Err(err) => {
            error!(phase = "init", bucket = %bucket, name, error = %err, "Cannot write escrow blob");
            Err(err)
        }
    }
}

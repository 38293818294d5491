use data_encoding::BASE64;
use secrecy::ExposeSecret;
use secrecy::SecretString;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::crypto::EnvelopeCrypto;
use crate::error::Error;
use crate::error::Result;
use crate::escrow::BlobStore;
use crate::escrow::UNSEAL_KEYS_BLOB;
use crate::vault::models::sys::init::PutInitResponse;
use crate::vault::models::sys::unseal::PutUnsealRequest;
use crate::vault::VaultApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsealOutcome {
    /// Vault reported `sealed: false` after `submitted` keys.
    Unsealed { submitted: usize },
    /// Every escrowed key was accepted but Vault is still sealed.
    Exhausted { submitted: usize, progress: i64 },
}

/// Fetches the escrowed keys and submits them one at a time, in escrowed
/// order, until Vault unseals.
///
/// Every call starts again from the first key; no progress is carried between
/// calls. A rejected key aborts the attempt without trying the rest.
pub async fn unseal<V, C, S>(
    config: &Config,
    vault: &V,
    crypto: &C,
    store: &S,
) -> Result<UnsealOutcome>
where
    V: VaultApi + ?Sized,
    C: EnvelopeCrypto + ?Sized,
    S: BlobStore + ?Sized,
{
    info!(phase = "unseal", "Reading unseal keys from escrow");
    let ciphertext = store
        .get(&config.bucket, UNSEAL_KEYS_BLOB)
        .await
        .map_err(|err| {
            error!(phase = "unseal", error = %err, "Failed reading unseal keys");
            err
        })?;

    let keys = open_unseal_keys(crypto, &ciphertext).await.map_err(|err| {
        error!(phase = "unseal", error = %err, "Failed decoding unseal keys");
        err
    })?;

    info!(phase = "unseal", keys = keys.len(), "Starting key submission");
    let mut progress = 0;
    for (i, key) in keys.iter().enumerate() {
        info!(phase = "unseal", "Submitting key #{i}");
        let request = PutUnsealRequest {
            key: key.expose_secret().to_owned(),
            reset: false,
        };
        let response = vault.submit_unseal_key(&request).await.map_err(|err| {
            error!(phase = "unseal", error = %err, "Failed submitting key #{i}");
            err
        })?;

        if !response.sealed {
            info!(phase = "unseal", "Successfully unsealed Vault");
            return Ok(UnsealOutcome::Unsealed { submitted: i + 1 });
        }
        progress = response.progress;
    }

    warn!(
        phase = "unseal",
        submitted = keys.len(),
        progress,
        "Submitted every escrowed key but Vault is still sealed"
    );
    Ok(UnsealOutcome::Exhausted {
        submitted: keys.len(),
        progress,
    })
}

/// Recovers the original init response body from an escrowed blob.
pub async fn open_escrow<C>(crypto: &C, ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: EnvelopeCrypto + ?Sized,
{
    let encoded = crypto.decrypt(ciphertext).await?;
    BASE64
        .decode(&encoded)
        .map_err(|err| Error::Protocol(format!("escrowed payload is not base64: {err}")))
}

async fn open_unseal_keys<C>(crypto: &C, ciphertext: &[u8]) -> Result<Vec<SecretString>>
where
    C: EnvelopeCrypto + ?Sized,
{
    let body = open_escrow(crypto, ciphertext).await?;
    let response: PutInitResponse = serde_json::from_slice(&body)
        .map_err(|err| Error::Protocol(format!("escrowed payload is malformed: {err}")))?;

    Ok(response
        .keys_base64
        .into_iter()
        .map(SecretString::from)
        .collect())
}

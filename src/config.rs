use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::error::Result;
use crate::Args;

/// Where escrowed blobs live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EscrowBackend {
    S3,
    File,
}

/// Validated, immutable runtime configuration. Built once at startup and
/// borrowed by the controller and both flows.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub vault_addr: url::Url,
    pub check_interval: Duration,
    pub health_timeout: Duration,
    pub request_timeout: Duration,
    pub tls_skip_verify: bool,
    pub bucket: String,
    pub kms_key_id: String,
    pub secret_shares: u8,
    pub secret_threshold: u8,
    pub escrow_backend: EscrowBackend,
    pub escrow_dir: PathBuf,
    pub once: bool,
}

impl TryFrom<&Args> for Config {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self> {
        if args.s3_bucket_name.trim().is_empty() {
            return Err(Error::Config(
                "S3_BUCKET_NAME must be set and not empty".to_owned(),
            ));
        }
        if args.kms_key_id.trim().is_empty() {
            return Err(Error::Config(
                "KMS_KEY_ID must be set and not empty".to_owned(),
            ));
        }
        if args.check_interval == 0 {
            return Err(Error::Config(
                "CHECK_INTERVAL must be greater than zero".to_owned(),
            ));
        }
        if args.health_timeout == 0 || args.request_timeout == 0 {
            return Err(Error::Config(
                "HEALTH_TIMEOUT and REQUEST_TIMEOUT must be greater than zero".to_owned(),
            ));
        }
        if args.secret_threshold == 0 || args.secret_threshold > args.secret_shares {
            return Err(Error::Config(format!(
                "secret threshold {} must be between 1 and secret shares {}",
                args.secret_threshold, args.secret_shares
            )));
        }

        Ok(Self {
            vault_addr: args.vault_addr.clone(),
            check_interval: Duration::from_secs(args.check_interval),
            health_timeout: Duration::from_secs(args.health_timeout),
            request_timeout: Duration::from_secs(args.request_timeout),
            tls_skip_verify: args.tls_skip_verify,
            bucket: args.s3_bucket_name.clone(),
            kms_key_id: args.kms_key_id.clone(),
            secret_shares: args.secret_shares,
            secret_threshold: args.secret_threshold,
            escrow_backend: args.escrow_backend,
            escrow_dir: args.escrow_dir.clone(),
            once: args.once,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            vault_addr: url::Url::parse("https://127.0.0.1:8200").unwrap(),
            check_interval: Duration::from_secs(10),
            health_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            tls_skip_verify: true,
            bucket: "vault-escrow".to_owned(),
            kms_key_id: "alias/vault".to_owned(),
            secret_shares: 5,
            secret_threshold: 3,
            escrow_backend: EscrowBackend::File,
            escrow_dir: PathBuf::from("."),
            once: false,
        }
    }
}

#![warn(clippy::pedantic)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod crypto;
mod error;
mod escrow;
#[cfg(test)]
mod fakes;
mod init;
mod lifecycle;
mod unseal;
mod vault;

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing::warn;
use tracing_subscriber::prelude::*;

use crate::config::Config;
use crate::config::EscrowBackend;
use crate::crypto::KmsCrypto;
use crate::escrow::EscrowStore;
use crate::escrow::FileStore;
use crate::escrow::S3Store;
use crate::lifecycle::Controller;
use crate::vault::VaultClient;

#[allow(clippy::doc_markdown)]
/// Keep an instance of HashiCorp Vault initialized and unsealed, escrowing
/// its keys encrypted with AWS KMS
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct Args {
    /// Address of the Vault server expressed as a URL and port.
    #[clap(long, env = "VAULT_ADDR", default_value = "https://127.0.0.1:8200")]
    vault_addr: url::Url,

    /// Seconds to wait between health checks.
    #[clap(long, env = "CHECK_INTERVAL", default_value_t = 10)]
    check_interval: u64,

    /// Bucket holding the encrypted root token and unseal keys.
    #[clap(long, env = "S3_BUCKET_NAME")]
    s3_bucket_name: String,

    /// KMS key used to encrypt the root token and unseal keys.
    #[clap(long, env = "KMS_KEY_ID")]
    kms_key_id: String,

    /// Number of shares to split the root key into.
    #[clap(long, env = "SECRET_SHARES", default_value_t = 5)]
    secret_shares: u8,

    /// Number of shares required to reconstruct the root key.
    ///
    /// This must be less than or equal `secret_shares`.
    #[clap(long, env = "SECRET_THRESHOLD", default_value_t = 3)]
    secret_threshold: u8,

    /// Seconds before a health check is abandoned.
    #[clap(long, env = "HEALTH_TIMEOUT", default_value_t = 2)]
    health_timeout: u64,

    /// Seconds before any other Vault, KMS or storage request is abandoned.
    #[clap(long, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// Accept self-signed or otherwise unverifiable Vault certificates.
    #[clap(
        long,
        env = "VAULT_SKIP_VERIFY",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    tls_skip_verify: bool,

    /// Where escrowed blobs are stored.
    #[clap(long, env = "ESCROW_BACKEND", value_enum, default_value_t = EscrowBackend::S3)]
    escrow_backend: EscrowBackend,

    /// Root directory for the `file` escrow backend. The bucket name becomes a
    /// subdirectory.
    #[clap(long, env = "ESCROW_DIR", default_value = ".")]
    escrow_dir: PathBuf,

    /// Check Vault once, act on its state, and exit.
    #[clap(long, env = "RUN_ONCE")]
    once: bool,

    /// Level directive for stdout logging.
    #[clap(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level)?;
    let config = Config::try_from(&args)?;
    info!(phase = "start", "Started process");

    let vault = VaultClient::new(&config)?;
    let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .timeout_config(
            aws_config::timeout::TimeoutConfig::builder()
                .operation_timeout(config.request_timeout)
                .build(),
        )
        .load()
        .await;
    let crypto = KmsCrypto::new(&sdk_config);
    let store = match config.escrow_backend {
        EscrowBackend::S3 => EscrowStore::S3(S3Store::new(&sdk_config)),
        EscrowBackend::File => EscrowStore::File(FileStore::new(config.escrow_dir.clone())),
    };
    let controller = Controller::new(&config, &vault, &crypto, &store);

    if config.once {
        controller.tick().await;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        warn!(phase = "stop", "Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });
    controller.run(shutdown_rx).await;

    info!(phase = "stop", "Stopped process");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::signal;
        use tokio::signal::unix::SignalKind;

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                warn!(error = %err, "Cannot listen for SIGTERM, only handling Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let fmt_filter = tracing_subscriber::filter::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .parse_lossy(log_level);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(fmt_filter);

    let subscriber = tracing_subscriber::Registry::default().with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

use tokio::sync::watch;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::Config;
use crate::crypto::EnvelopeCrypto;
use crate::escrow::BlobStore;
use crate::init::initialize;
use crate::unseal::unseal;
use crate::unseal::UnsealOutcome;
use crate::vault::models::sys::health::HealthState;
use crate::vault::VaultApi;

/// What a single poll observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Unreachable,
    Observed(HealthState),
}

/// Polls Vault health and runs init or unseal when the state calls for it.
///
/// Assumes it is the only controller driving this Vault.
pub struct Controller<'a, V: ?Sized, C: ?Sized, S: ?Sized> {
    config: &'a Config,
    vault: &'a V,
    crypto: &'a C,
    store: &'a S,
}

impl<'a, V, C, S> Controller<'a, V, C, S>
where
    V: VaultApi + ?Sized,
    C: EnvelopeCrypto + ?Sized,
    S: BlobStore + ?Sized,
{
    pub fn new(config: &'a Config, vault: &'a V, crypto: &'a C, store: &'a S) -> Self {
        Self {
            config,
            vault,
            crypto,
            store,
        }
    }

    /// Polls until `shutdown` flips to true (or its sender goes away).
    ///
    /// The signal interrupts the health probe, the unseal flow and the wait
    /// between polls. Initialization is never interrupted: once Vault has
    /// handed out keys they must reach escrow.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            vault_addr = %self.config.vault_addr,
            interval = ?self.config.check_interval,
            "Starting lifecycle loop"
        );
        while !*shutdown.borrow() {
            let tick = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                tick = self.probe() => tick,
            };

            self.initialize_if_needed(tick).await;

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                () = self.unseal_if_needed(tick) => {}
            }

            debug!("Next check in {:?}", self.config.check_interval);
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                () = tokio::time::sleep(self.config.check_interval) => {}
            }
        }
        info!("Lifecycle loop stopped");
    }

    /// One probe and whatever flow the observed state requires.
    pub async fn tick(&self) -> Tick {
        let tick = self.probe().await;
        self.initialize_if_needed(tick).await;
        self.unseal_if_needed(tick).await;
        tick
    }

    async fn probe(&self) -> Tick {
        let state = match self.vault.health().await {
            Ok(state) => state,
            Err(err) => {
                warn!(phase = "health", error = %err, "Vault is unreachable");
                return Tick::Unreachable;
            }
        };

        match state {
            HealthState::ReadyUnsealed => {
                info!(phase = "health", "Vault is initialized and unsealed");
            }
            HealthState::StandbyUnsealed => {
                info!(phase = "health", "Vault is unsealed and in standby mode");
            }
            HealthState::Uninitialized => {
                info!(
                    phase = "health",
                    "Vault is not initialized, initializing and unsealing"
                );
            }
            HealthState::Sealed => {
                info!(phase = "health", "Vault is sealed, unsealing");
            }
            HealthState::Unknown(status) => {
                warn!(phase = "health", status, "Vault is in an unknown state");
            }
        }

        Tick::Observed(state)
    }

    async fn initialize_if_needed(&self, tick: Tick) {
        if tick == Tick::Observed(HealthState::Uninitialized) {
            // Failures are logged by the flow; unsealing is attempted regardless.
            let _ = initialize(self.config, self.vault, self.crypto, self.store).await;
        }
    }

    async fn unseal_if_needed(&self, tick: Tick) {
        if !matches!(
            tick,
            Tick::Observed(HealthState::Uninitialized | HealthState::Sealed)
        ) {
            return;
        }

        match unseal(self.config, self.vault, self.crypto, self.store).await {
            Ok(UnsealOutcome::Unsealed { submitted }) => {
                debug!(phase = "unseal", submitted, "Unseal attempt finished");
            }
            Ok(UnsealOutcome::Exhausted {
                submitted,
                progress,
            }) => {
                error!(
                    phase = "unseal",
                    submitted, progress, "Unable to completely unseal Vault"
                );
            }
            // Already logged by the flow.
            Err(_) => {}
        }
    }
}

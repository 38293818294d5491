pub mod models;

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::vault::models::sys::health::*;
use crate::vault::models::sys::init::*;
use crate::vault::models::sys::unseal::*;

/// The slice of the Vault HTTP API the sidecar drives.
#[async_trait::async_trait]
pub trait VaultApi {
    /// Probe `/v1/sys/health`. Only transport failures are errors; every
    /// status code maps to some [`HealthState`].
    async fn health(&self) -> Result<HealthState>;

    async fn start_init(&self, request: &PutInitRequest) -> Result<InitPayload>;

    async fn submit_unseal_key(&self, request: &PutUnsealRequest) -> Result<PutUnsealResponse>;
}

pub struct VaultClient {
    pub addr: url::Url,
    pub http: reqwest::Client,
    health_timeout: Duration,
}

impl VaultClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Vault commonly serves a self-signed certificate on loopback.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.tls_skip_verify)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| Error::Config(format!("building HTTP client: {err}")))?;

        Ok(Self {
            addr: config.vault_addr.clone(),
            http,
            health_timeout: config.health_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        self.addr
            .join(path)
            .map_err(|err| Error::Config(format!("invalid Vault address: {err}")))
    }
}

fn expect_ok(op: &str, status: StatusCode) -> Result<()> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(Error::Protocol(format!("{op}: non 200 status code: {status}")))
    }
}

#[async_trait::async_trait]
impl VaultApi for VaultClient {
    async fn health(&self) -> Result<HealthState> {
        let endpoint = self.endpoint("v1/sys/health")?;

        let response = self
            .http
            .get(endpoint)
            .timeout(self.health_timeout)
            .send()
            .await?;

        Ok(HealthState::from(response.status()))
    }

    async fn start_init(&self, request: &PutInitRequest) -> Result<InitPayload> {
        let endpoint = self.endpoint("v1/sys/init")?;

        let response = self.http.put(endpoint).json(request).send().await?;
        expect_ok("init", response.status())?;
        let body = response.bytes().await?;

        InitPayload::from_body(body.to_vec())
            .map_err(|err| Error::Protocol(format!("init: malformed response: {err}")))
    }

    async fn submit_unseal_key(&self, request: &PutUnsealRequest) -> Result<PutUnsealResponse> {
        let endpoint = self.endpoint("v1/sys/unseal")?;

        let response = self.http.put(endpoint).json(request).send().await?;
        expect_ok("unseal", response.status())?;
        let body = response.bytes().await?;

        serde_json::from_slice(&body)
            .map_err(|err| Error::Protocol(format!("unseal: malformed response: {err}")))
    }
}

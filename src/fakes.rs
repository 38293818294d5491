//! In-memory stand-ins for Vault, KMS and the escrow bucket.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use data_encoding::BASE64;

use crate::crypto::EnvelopeCrypto;
use crate::error::Error;
use crate::error::EscrowOp;
use crate::error::Result;
use crate::escrow::BlobStore;
use crate::vault::models::sys::health::HealthState;
use crate::vault::models::sys::init::*;
use crate::vault::models::sys::unseal::*;
use crate::vault::VaultApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Health,
    Init { shares: u8, threshold: u8 },
    Unseal(String),
}

/// Scripted Vault. Health answers are popped in order (`None` is a transport
/// failure); once the script runs out Vault reports ready.
#[derive(Clone, Default)]
pub struct FakeVault {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub probe_times: Arc<Mutex<Vec<tokio::time::Instant>>>,
    pub health_script: Arc<Mutex<VecDeque<Option<HealthState>>>>,
    /// Zero-based submission index whose response flips `sealed` to false.
    pub unseals_at: Option<usize>,
    /// Zero-based submission index that gets a non 200 status.
    pub rejects_at: Option<usize>,
    pub init_fails: bool,
    pub init_body: Vec<u8>,
}

impl FakeVault {
    pub fn new(script: &[Option<HealthState>]) -> Self {
        Self {
            health_script: Arc::new(Mutex::new(script.iter().copied().collect())),
            init_body: init_body(&["k0", "k1", "k2", "k3", "k4"]),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn unseal_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Unseal(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn init_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Init { .. }))
            .count()
    }
}

/// A Vault init response body whose `keys_base64` are the given strings.
pub fn init_body(keys_base64: &[&str]) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "keys": keys_base64.iter().map(|k| format!("hex-{k}")).collect::<Vec<_>>(),
        "keys_base64": keys_base64,
        "root_token": "s.fake-root-token",
    }))
    .unwrap()
}

#[async_trait::async_trait]
impl VaultApi for FakeVault {
    async fn health(&self) -> Result<HealthState> {
        self.calls.lock().unwrap().push(Call::Health);
        self.probe_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        match self.health_script.lock().unwrap().pop_front() {
            Some(Some(state)) => Ok(state),
            Some(None) => Err(Error::Network("connection refused".to_owned())),
            None => Ok(HealthState::ReadyUnsealed),
        }
    }

    async fn start_init(&self, request: &PutInitRequest) -> Result<InitPayload> {
        self.calls.lock().unwrap().push(Call::Init {
            shares: request.secret_shares,
            threshold: request.secret_threshold,
        });
        if self.init_fails {
            return Err(Error::Protocol("init: non 200 status code: 400".to_owned()));
        }
        Ok(InitPayload::from_body(self.init_body.clone()).unwrap())
    }

    async fn submit_unseal_key(&self, request: &PutUnsealRequest) -> Result<PutUnsealResponse> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Unseal(request.key.clone()));
            calls
                .iter()
                .filter(|call| matches!(call, Call::Unseal(_)))
                .count()
                - 1
        };
        if self.rejects_at == Some(index) {
            return Err(Error::Protocol(
                "unseal: non 200 status code: 400".to_owned(),
            ));
        }
        let sealed = self.unseals_at != Some(index);
        Ok(PutUnsealResponse {
            sealed,
            t: 3,
            n: 5,
            progress: if sealed { index as i64 + 1 } else { 0 },
        })
    }
}

/// Reversible "encryption" that tags ciphertext with the key id, so decrypt
/// needs no key argument.
#[derive(Clone, Default)]
pub struct FakeCrypto {
    pub fails: bool,
    pub encrypted: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeCrypto {
    fn seal(key_id: &str, plaintext: &[u8]) -> Vec<u8> {
        let mut out = key_id.as_bytes().to_vec();
        out.push(0);
        out.extend(plaintext.iter().rev());
        out
    }

    /// Escrow content the init flow would have produced for `body`.
    pub fn escrowed_keys(key_id: &str, body: &[u8]) -> Vec<u8> {
        Self::seal(key_id, BASE64.encode(body).as_bytes())
    }
}

#[async_trait::async_trait]
impl EnvelopeCrypto for FakeCrypto {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        if self.fails {
            return Err(Error::Crypto("access denied".to_owned()));
        }
        self.encrypted.lock().unwrap().push(plaintext.to_vec());
        Ok(Self::seal(key_id, plaintext))
    }

    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if self.fails {
            return Err(Error::Crypto("access denied".to_owned()));
        }
        let split = ciphertext
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| Error::Crypto("invalid ciphertext".to_owned()))?;
        Ok(ciphertext[split + 1..].iter().rev().copied().collect())
    }
}

#[derive(Clone, Default)]
pub struct FakeStore {
    pub blobs: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
    pub failing: Arc<Mutex<HashSet<String>>>,
    pub puts: Arc<Mutex<Vec<String>>>,
    pub gets: Arc<Mutex<Vec<String>>>,
    /// Every `put` sleeps this long before writing.
    pub put_delay: Option<Duration>,
}

impl FakeStore {
    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_owned());
    }

    pub fn insert(&self, bucket: &str, name: &str, data: Vec<u8>) {
        self.blobs
            .lock()
            .unwrap()
            .insert((bucket.to_owned(), name.to_owned()), data);
    }

    pub fn blob(&self, bucket: &str, name: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(&(bucket.to_owned(), name.to_owned()))
            .cloned()
    }
}

#[async_trait::async_trait]
impl BlobStore for FakeStore {
    async fn put(&self, bucket: &str, name: &str, data: &[u8]) -> Result<()> {
        self.puts.lock().unwrap().push(name.to_owned());
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(name) {
            return Err(Error::escrow(EscrowOp::Put, name, "access denied"));
        }
        self.insert(bucket, name, data.to_vec());
        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> Result<Vec<u8>> {
        self.gets.lock().unwrap().push(name.to_owned());
        if self.failing.lock().unwrap().contains(name) {
            return Err(Error::escrow(EscrowOp::Get, name, "access denied"));
        }
        self.blob(bucket, name)
            .ok_or_else(|| Error::escrow(EscrowOp::Get, name, "no such key"))
    }
}

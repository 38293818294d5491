use serde::Deserialize;
use serde::Serialize;

use crate::config::Config;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutInitRequest {
    pub secret_shares: u8,
    pub secret_threshold: u8,
}

impl From<&Config> for PutInitRequest {
    fn from(config: &Config) -> Self {
        Self {
            secret_shares: config.secret_shares,
            secret_threshold: config.secret_threshold,
        }
    }
}

/// Root keys, base 64 encoded root keys and initial root token, index-aligned
/// in the order Vault produced them.
#[derive(Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutInitResponse {
    pub keys: Vec<String>,
    pub keys_base64: Vec<String>,
    pub root_token: String,
}

impl std::fmt::Debug for PutInitResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutInitResponse")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field(
                "keys_base64",
                &format_args!("[{} redacted]", self.keys_base64.len()),
            )
            .field("root_token", &"[redacted]")
            .finish()
    }
}

/// A parsed init response together with the exact bytes Vault sent.
///
/// The raw body is what gets escrowed, so it is kept verbatim.
#[derive(Clone, PartialEq)]
pub struct InitPayload {
    pub response: PutInitResponse,
    pub body: Vec<u8>,
}

impl std::fmt::Debug for InitPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitPayload")
            .field("response", &self.response)
            .field("body", &format_args!("[{} bytes]", self.body.len()))
            .finish()
    }
}

impl InitPayload {
    pub fn from_body(body: Vec<u8>) -> serde_json::Result<Self> {
        let response = serde_json::from_slice(&body)?;
        Ok(Self { response, body })
    }
}

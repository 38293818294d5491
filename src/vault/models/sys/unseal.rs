use serde::Deserialize;
use serde::Serialize;

#[derive(Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutUnsealRequest {
    pub key: String,
    /// Discards any progress made so far. The unseal flow never sets this.
    pub reset: bool,
}

impl std::fmt::Debug for PutUnsealRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutUnsealRequest")
            .field("key", &"[redacted]")
            .field("reset", &self.reset)
            .finish()
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutUnsealResponse {
    pub sealed: bool,
    pub t: i64,
    pub n: i64,
    pub progress: i64,
}

use thiserror::Error;

/// Failures the sidecar can run into while driving Vault.
///
/// Nothing here terminates the process except [`Error::Config`]; everything
/// else aborts the current flow and waits for the next poll.
#[derive(Debug, Error)]
pub enum Error {
    /// Vault could not be reached, or the request timed out.
    #[error("network error: {0}")]
    Network(String),

    /// Vault answered with something other than what the API promises.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The envelope encryption service refused or failed the operation.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Reading or writing an escrowed blob failed.
    #[error("escrow {op} of {name} failed: {reason}")]
    Escrow {
        op: EscrowOp,
        name: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowOp {
    Put,
    Get,
}

impl std::fmt::Display for EscrowOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscrowOp::Put => f.write_str("put"),
            EscrowOp::Get => f.write_str("get"),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl Error {
    pub fn escrow(op: EscrowOp, name: &str, reason: impl ToString) -> Self {
        Self::Escrow {
            op,
            name: name.to_owned(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

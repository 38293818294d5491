use reqwest::StatusCode;

/// Server state as classified from the `/v1/sys/health` status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// 200
    ReadyUnsealed,
    /// 429
    StandbyUnsealed,
    /// 501
    Uninitialized,
    /// 503
    Sealed,
    Unknown(u16),
}

impl From<StatusCode> for HealthState {
    fn from(status: StatusCode) -> Self {
        match status.as_u16() {
            200 => Self::ReadyUnsealed,
            429 => Self::StandbyUnsealed,
            501 => Self::Uninitialized,
            503 => Self::Sealed,
            other => Self::Unknown(other),
        }
    }
}

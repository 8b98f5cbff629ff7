use thiserror::Error;

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkError(format!("Request timed out: {}", err))
        } else {
            Self::NetworkError(format!("Transport error: {}", err))
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        Self::PersistenceError(format!("I/O error: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Log service error: {0}")]
    LogServiceError(String),

    #[error("Verification failed: {0}")]
    VerificationError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Consistency violation: verified log at tree size {current} contradicts earlier verified state at tree size {previous}")]
    ConsistencyViolation { previous: u64, current: u64 },

    #[error("Timestamp authority error: {0}")]
    TimestampError(String),

    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// A verified log state that contradicts an earlier one. Nothing signed by the log
    /// can be trusted after this, so callers stop instead of retrying.
    pub fn is_fatal_to_trust(&self) -> bool {
        matches!(self, Self::ConsistencyViolation { .. })
    }

    /// Failures that are expected to clear up by the next scheduled tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_)
                | Self::LogServiceError(_)
                | Self::TimestampError(_)
                | Self::VerificationError(_)
                | Self::NotificationError(_)
        )
    }

    pub fn malformed_commitment(msg: impl Into<String>) -> Self {
        Self::VerificationError(format!("malformed commitment: {}", msg.into()))
    }
}

//! Error types for the sync engine.

use std::time::Duration;
use thiserror::Error;
use todo_store::StoreError;
use todo_sync_protocol::ProtocolError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Transport failure, non-success status, or timeout.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// HTTP status, if the server answered.
        status: Option<u16>,
        /// Whether the call hit the request timeout.
        timed_out: bool,
    },

    /// BYOB is disabled or no backend URL is set.
    #[error("remote sync is not configured (enable BYOB and set a backend URL)")]
    NotConfigured,

    /// Another pull or push is already running.
    #[error("a sync operation is already in progress")]
    Busy,

    /// The configuration cannot be turned into a request.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Local store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Wire decoding error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl SyncError {
    /// Creates a transport error without a status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
            timed_out: false,
        }
    }

    /// Creates an error for a non-success HTTP status.
    pub fn http_status(status: u16, body: impl AsRef<str>) -> Self {
        let body = body.as_ref().trim();
        let message = if body.is_empty() {
            format!("server answered {status}")
        } else {
            format!("server answered {status}: {body}")
        };
        Self::Network {
            message,
            status: Some(status),
            timed_out: false,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(after: Duration) -> Self {
        Self::Network {
            message: format!("request timed out after {after:?}"),
            status: None,
            timed_out: true,
        }
    }

    /// Returns true if this is a network error.
    pub fn is_network(&self) -> bool {
        matches!(self, SyncError::Network { .. })
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network { status: None, .. } => true,
            SyncError::Network {
                status: Some(status),
                ..
            } => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
            timed_out: e.is_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::network("connection refused").is_retryable());
        assert!(SyncError::timeout(Duration::from_secs(10)).is_retryable());
        assert!(SyncError::http_status(503, "").is_retryable());
        assert!(!SyncError::http_status(404, "Not found!").is_retryable());
        assert!(!SyncError::NotConfigured.is_retryable());
        assert!(!SyncError::Busy.is_retryable());
    }

    #[test]
    fn error_display() {
        let err = SyncError::http_status(404, r#"{"message":"Not found!"}"#);
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Not found!"));

        match SyncError::timeout(Duration::from_secs(10)) {
            SyncError::Network { timed_out, .. } => assert!(timed_out),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn store_errors_convert() {
        let err: SyncError = StoreError::NoActiveList.into();
        assert!(matches!(err, SyncError::Store(StoreError::NoActiveList)));
        assert!(!err.is_network());
    }
}

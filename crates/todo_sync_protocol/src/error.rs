//! Error types for protocol decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The `type` tag of an event is not one of the known event types.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// The event envelope or its payload does not match the expected shape.
    #[error("invalid payload for {event_type}: {message}")]
    InvalidPayload {
        /// Event type whose payload failed to decode.
        event_type: String,
        /// Decoder message.
        message: String,
    },

    /// The body is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Creates an invalid payload error.
    pub fn invalid_payload(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            event_type: event_type.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::UnknownEventType("rename_todo".into());
        assert_eq!(err.to_string(), "unknown event type: rename_todo");

        let err = ProtocolError::invalid_payload("add_todo", "missing field `todo`");
        assert!(err.to_string().contains("add_todo"));
        assert!(err.to_string().contains("missing field"));
    }
}

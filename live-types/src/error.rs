//! Error types for the live status wire format.

use thiserror::Error;

/// Errors that can occur while decoding device payloads.
#[derive(Debug, Error)]
pub enum WireError {
    /// Payload was not valid JSON, or a field had an unusable value
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload was valid JSON but not an object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A `KEY=VALUE` preference assignment could not be parsed
    #[error("invalid preference assignment: {0}")]
    InvalidAssignment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WireError::NotAnObject("array");
        assert_eq!(err.to_string(), "expected a JSON object, got array");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WireError>();
    }
}

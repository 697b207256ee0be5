//! Error types and handling for the messaging host.

/// Result type for messaging host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Error types for messaging host operations.
///
/// Launch failures do not appear here: the caller learns about those through
/// `error` Result Envelopes on the wire, never through this type.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Framing-level errors (truncated length prefix, truncated body,
    /// oversized declared length). Once the stream is desynchronized the
    /// channel cannot recover, so these terminate the message loop.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Message body decode errors (invalid UTF-8, invalid JSON, or a body
    /// that is not double-JSON-encoded). The loop survives these.
    #[error("Decode error: {0}")]
    Decode(String),

    /// I/O errors on the stdio streams
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors on the response path
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HostError {
    /// Create a protocol error.
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a decode error.
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode(message.into())
    }

    /// Get the error code for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }
}

//! Error types for record sinks.

/// Errors that can occur while constructing a sink or publishing a record.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("put_record to stream '{stream}' failed: {message}")]
    PutRecord { stream: String, message: String },

    #[error("stream '{stream}' is not available: {message}")]
    StreamUnavailable { stream: String, message: String },

    #[error("AWS configuration error: {0}")]
    AwsConfig(String),

    #[error("failed to start sink runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl SinkError {
    /// Whether the failure is specific to one publish attempt.
    ///
    /// Transient failures drop the record; the next record may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SinkError::PutRecord { .. } | SinkError::Encode(_))
    }
}

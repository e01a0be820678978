use thiserror::Error;

/// Failure of a remote read, write or RPC. Never fatal to the caller.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network / transport failure before a response arrived
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record not found: {table}/{id}")]
    NotFound { table: String, id: String },

    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Text suitable for a user-facing notification.
    pub fn message(&self) -> String {
        match self {
            RemoteError::Status { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

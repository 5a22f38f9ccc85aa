//! Error types for relay-chat.

use thiserror::Error;

/// Common error type for relay-chat.
#[derive(Error, Debug)]
pub enum ChatError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket transport error.
    ///
    /// Transport errors from tungstenite are converted to their display string.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Invalid server URL.
    #[error("invalid URL: {0}")]
    Url(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ChatError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ChatError::WebSocket(e.to_string())
    }
}

impl From<url::ParseError> for ChatError {
    fn from(e: url::ParseError) -> Self {
        ChatError::Url(e.to_string())
    }
}

/// Result type alias for relay-chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

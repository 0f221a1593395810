//! Error types for the WhatsOnChain client.

use thiserror::Error;


/// Client error types.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request failed inside the middleware stack (after retries).
    #[error("HTTP middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// URL scheme is not `ws` or `wss`.
    #[error("Unsupported websocket scheme: {0}")]
    UnsupportedScheme(String),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from API.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The socket server rejected a command.
    #[error("Protocol error ({code}): {message}")]
    Protocol {
        /// Server error code.
        code: u32,
        /// Server error message.
        message: String,
    },

    /// Operation did not finish in time.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The websocket client is not connected.
    #[error("Not connected")]
    NotConnected,

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,
}

//! Transport port

use async_trait::async_trait;
use steward_domain::{ApiError, ApiRequest, ApiResponse};

/// Errors raised before an HTTP answer is received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request timed out.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("DNS lookup failed for {host}: {message}")]
    DnsError {
        /// Host being resolved.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection failed for another reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be built.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        Self::Network(error.to_string())
    }
}

/// Port for sending requests to the backend.
///
/// Implementations resolve `request.path` against the configured base URL,
/// send the `Authorization` header exactly as given, and return any HTTP
/// answer (including 4xx/5xx) as an [`ApiResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request.
    ///
    /// # Errors
    /// Returns an error only when no HTTP answer was received.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

//! Error types for the endpoint bindings.

use incidentio_http_client::HttpClientError;
use thiserror::Error;

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by [`crate::IncidentIoClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request pipeline failed (network, status, breaker, retries).
    #[error(transparent)]
    Client(#[from] HttpClientError),

    /// The response body did not match the expected shape.
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        /// Endpoint that produced the body.
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An argument was rejected before any request was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ApiError {
    /// Get the HTTP status code if the API answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Client(e) => e.status_code(),
            _ => None,
        }
    }

    /// Check if the circuit breaker refused the request.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_service_unavailable())
    }
}

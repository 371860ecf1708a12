//! HTTP Client error types.

use incidentio_ratelimit::RateLimitError;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Result type for HTTP client operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// A retryable failure kept happening until the retry budget ran out.
    #[error("request failed after {attempts} attempts{}: {source}", status_suffix(.status))]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Status of the last attempt, if a response was received.
        status: Option<u16>,
        /// The last attempt's error.
        #[source]
        source: Box<HttpClientError>,
    },

    /// A failure the retry policy does not retry (e.g. 4xx other than 408/429).
    #[error("request failed after {attempts} attempts{} (not retryable): {source}", status_suffix(.status))]
    NonRetryable {
        /// Number of attempts made.
        attempts: u32,
        /// Status of the last attempt, if a response was received.
        status: Option<u16>,
        /// The last attempt's error.
        #[source]
        source: Box<HttpClientError>,
    },

    /// Circuit breaker is open, rejecting requests.
    #[error("circuit breaker is open, service may be down")]
    CircuitOpen,

    /// Circuit breaker is half-open and its trial slots are taken.
    #[error("circuit breaker is half-open and at its trial request limit")]
    TooManyHalfOpenRequests,

    /// Waiting for a rate-limit token was aborted.
    #[error("rate limiter error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// The caller cancelled the operation.
    #[error("request cancelled")]
    Cancelled,

    /// The overall deadline for the request (all attempts) elapsed.
    #[error("request deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// A single attempt timed out.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The API answered with a non-2xx status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message, including any API error details.
        message: String,
    },

    /// Connection-level failure reported by a transport.
    #[error("request failed: {0}")]
    Transport(String),

    /// Invalid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Request building error.
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" (status: {})", status),
        None => String::new(),
    }
}

/// Error envelope returned by the incident.io API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: String,
}

impl HttpClientError {
    /// Build a status error from a non-2xx response, folding in the API's
    /// `{"error": {"message", "code"}}` details when present.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(body);

        let message = match serde_json::from_slice::<ApiErrorBody>(body) {
            Ok(parsed) if !parsed.error.message.is_empty() => {
                let mut message = format!("API error: {} (HTTP {})", parsed.error.message, status);
                if !parsed.error.code.is_empty() {
                    message.push_str(&format!(" [code: {}]", parsed.error.code));
                }
                format!("{}. Full response: {}", message, raw)
            }
            _ => format!("HTTP {}: {}", status, raw),
        };

        Self::Status { status, message }
    }

    /// Check if this error came from the connection rather than an HTTP status.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Http(e) => e.status().is_none(),
            _ => false,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::DeadlineExceeded(_))
            || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if the request was abandoned because the caller went away.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::RateLimit(RateLimitError::Cancelled))
    }

    /// Check if the circuit breaker refused the request.
    ///
    /// Callers can fall back to stale data when this is true.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Self::CircuitOpen | Self::TooManyHalfOpenRequests)
    }

    /// Number of attempts made, for terminal retry outcomes.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::RetryExhausted { attempts, .. } | Self::NonRetryable { attempts, .. } => {
                Some(*attempts)
            }
            _ => None,
        }
    }

    /// Get the HTTP status code if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RetryExhausted { status, .. } | Self::NonRetryable { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_with_api_error() {
        let body = br#"{"error":{"message":"Incident not found","code":"not_found"}}"#;
        let error = HttpClientError::from_response(404, body);

        let message = error.to_string();
        assert!(message.starts_with("API error: Incident not found (HTTP 404) [code: not_found]"));
        assert!(message.contains("Full response:"));
        assert_eq!(error.status_code(), Some(404));
    }

    #[test]
    fn test_from_response_without_code() {
        let body = br#"{"error":{"message":"Bad input"}}"#;
        let error = HttpClientError::from_response(422, body);
        assert!(error.to_string().starts_with("API error: Bad input (HTTP 422)."));
    }

    #[test]
    fn test_from_response_plain_body() {
        let error = HttpClientError::from_response(502, b"upstream gone");
        assert_eq!(error.to_string(), "HTTP 502: upstream gone");
    }

    #[test]
    fn test_from_response_empty_message_shows_body() {
        let body = br#"{"error":{"message":""}}"#;
        let error = HttpClientError::from_response(500, body);
        assert!(error.to_string().starts_with("HTTP 500: "));
    }

    #[test]
    fn test_retry_exhausted_display() {
        let error = HttpClientError::RetryExhausted {
            attempts: 3,
            status: Some(503),
            source: Box::new(HttpClientError::from_response(503, b"down")),
        };
        assert_eq!(
            error.to_string(),
            "request failed after 3 attempts (status: 503): HTTP 503: down"
        );
        assert_eq!(error.attempts(), Some(3));
        assert_eq!(error.status_code(), Some(503));
    }

    #[test]
    fn test_classification() {
        assert!(HttpClientError::Transport("reset".into()).is_transport());
        assert!(HttpClientError::Timeout(Duration::from_secs(1)).is_transport());
        assert!(!HttpClientError::from_response(500, b"").is_transport());

        assert!(HttpClientError::CircuitOpen.is_service_unavailable());
        assert!(HttpClientError::TooManyHalfOpenRequests.is_service_unavailable());
        assert!(!HttpClientError::Cancelled.is_service_unavailable());

        assert!(HttpClientError::RateLimit(RateLimitError::Cancelled).is_cancelled());
    }
}

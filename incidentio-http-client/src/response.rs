//! Successful API response.

use crate::{HttpClientError, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// A 2xx response, with the number of attempts it took.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    body: Bytes,
    attempts: u32,
}

impl ApiResponse {
    pub(crate) fn new(status: u16, body: Bytes, attempts: u32) -> Self {
        Self {
            status,
            body,
            attempts,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Attempts made, including the successful one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Get the response body as bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response and return the body as bytes.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| HttpClientError::Json(e.to_string()))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| HttpClientError::Json(e.to_string()))
    }
}

//! The REST transport seam.
//!
//! The application layer never talks HTTP itself.  It asks a
//! [`RestTransport`] for documents and raw responses; the infrastructure
//! layer provides the reqwest implementation
//! ([`HttpTransport`](crate::infrastructure::http::HttpTransport)) and tests
//! provide in-memory ones.
//!
//! Authentication is the transport's business: once constructed, every
//! request it issues is already authenticated.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by a [`RestTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response not read.
    #[error("request to {url} failed: {message}")]
    Request {
        /// Request URL.
        url: String,
        /// Transport-level failure description.
        message: String,
    },

    /// A document read answered with a non-success status.
    #[error("request to {url} returned HTTP status {status}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A document body was not valid JSON.
    #[error("response from {url} is not valid JSON: {message}")]
    Decode {
        /// Request URL.
        url: String,
        /// Decoder message.
        message: String,
    },
}

/// A raw HTTP response, as returned by GET actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl RestResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decoder error when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Issues authenticated requests against the machine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// GETs `url` and decodes the body as a JSON document.
    ///
    /// Non-success statuses are reported as [`TransportError::Status`].
    async fn get_document(&self, url: &str) -> Result<Value, TransportError>;

    /// GETs `url` with the given `Content-Type` and returns the raw response
    /// whatever its status.
    async fn get(&self, url: &str, content_type: &str) -> Result<RestResponse, TransportError>;

    /// POSTs `body` as JSON to `url` with the given `Content-Type` and
    /// returns the raw response whatever its status.
    async fn post_json(
        &self,
        url: &str,
        content_type: &str,
        body: &Value,
    ) -> Result<RestResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success_covers_2xx_only() {
        let ok = |status| RestResponse {
            status,
            body: String::new(),
        };
        assert!(ok(200).is_success());
        assert!(ok(204).is_success());
        assert!(!ok(199).is_success());
        assert!(!ok(300).is_success());
        assert!(!ok(409).is_success());
    }

    #[test]
    fn test_json_decodes_body() {
        let response = RestResponse {
            status: 200,
            body: r#"{"level": 3}"#.to_string(),
        };
        let value: Value = response.json().unwrap();
        assert_eq!(value["level"], 3);
    }
}

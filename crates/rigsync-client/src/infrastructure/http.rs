//! reqwest implementation of [`RestTransport`].
//!
//! One `reqwest::Client` with a cookie store is shared by every request.
//! When credentials are configured, [`HttpTransport::connect`] logs in
//! first; the session cookie set by the machine then authenticates all
//! later requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use rigsync_core::protocol::LOGIN_PATH;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::application::transport::{RestResponse, RestTransport, TransportError};
use crate::infrastructure::config::ClientConfig;

/// HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

fn request_error(url: &str, e: reqwest::Error) -> TransportError {
    TransportError::Request {
        url: url.to_string(),
        message: e.to_string(),
    }
}

impl HttpTransport {
    /// Builds a client with a cookie store and the given request timeout.
    ///
    /// # Errors
    ///
    /// [`TransportError::Request`] if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| request_error("", e))?;
        Ok(Self { client })
    }

    /// Builds the transport for `config`, logging in when credentials are set.
    pub async fn connect(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = Self::new(config.request_timeout())?;
        if let Some((user, password)) = config.credentials() {
            transport.login(&config.base_url(), user, password).await?;
        }
        Ok(transport)
    }

    /// `POST {base}/login` with the user and password.
    ///
    /// # Errors
    ///
    /// [`TransportError::Status`] when the machine rejects the credentials.
    pub async fn login(
        &self,
        base_url: &str,
        user: &str,
        password: &str,
    ) -> Result<(), TransportError> {
        let url = format!("{base_url}{LOGIN_PATH}");
        let response = self
            .client
            .post(&url)
            .json(&json!({"user": user, "password": password}))
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }
        info!("logged in to {base_url} as '{user}'");
        Ok(())
    }

    async fn into_rest_response(
        url: &str,
        response: reqwest::Response,
    ) -> Result<RestResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| request_error(url, e))?;
        Ok(RestResponse { status, body })
    }
}

#[async_trait]
impl RestTransport for HttpTransport {
    async fn get_document(&self, url: &str) -> Result<Value, TransportError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        let response = Self::into_rest_response(url, response).await?;
        if !response.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        response.json().map_err(|e| TransportError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn get(&self, url: &str, content_type: &str) -> Result<RestResponse, TransportError> {
        debug!("GET {url} ({content_type})");
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, content_type)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        Self::into_rest_response(url, response).await
    }

    async fn post_json(
        &self,
        url: &str,
        content_type: &str,
        body: &Value,
    ) -> Result<RestResponse, TransportError> {
        debug!("POST {url} ({content_type})");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        Self::into_rest_response(url, response).await
    }
}

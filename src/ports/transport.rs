//! Transport port
//!
//! The only point of contact with the backend. Timeouts belong to the
//! transport; callers see a timeout as an ordinary failure.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;
use crate::queue::HttpMethod;

/// Executes one mutation against the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &Value,
    ) -> Result<(), TransportError>;
}

// == HTTP Transport ==
/// reqwest-backed transport that sends JSON payloads to `base_url + endpoint`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

/// Longest response body kept in a rejection message.
const MAX_ERROR_BODY: usize = 256;

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &Value,
    ) -> Result<(), TransportError> {
        let url = self.url(endpoint);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.into(), &url);
        if !payload.is_null() {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        if status.is_client_error() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !message.is_char_boundary(end) {
                    end -= 1;
                }
                message.truncate(end);
            }
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Err(TransportError::NetworkFailure(format!(
            "server responded with {}",
            status
        )))
    }
}

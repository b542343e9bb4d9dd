use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, header};

use crate::errors::ProviderError;
use crate::providers::{BodyEncoding, ProviderResponse, TranslateRequest, Transport};

/// HTTP transport for LibreTranslate-compatible providers
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client for API requests
    client: Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpTransport {
    /// Create a new transport.
    ///
    /// `timeout` is a hard ceiling at the connection level; the translation
    /// client applies its own, usually shorter, per-call deadline on top.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a transport around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        request: &TranslateRequest,
        encoding: BodyEncoding,
    ) -> Result<ProviderResponse, ProviderError> {
        let builder = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json");

        let builder = match encoding {
            BodyEncoding::Json => builder.json(request),
            BodyEncoding::Form => builder.form(request),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout { after_ms: 0 }
            } else if e.is_connect() {
                ProviderError::ConnectionError(e.to_string())
            } else {
                ProviderError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("failed to read response body: {}", e)))?;

        debug!("POST {} ({}) -> {}", url, encoding, status);

        Ok(ProviderResponse { status, body })
    }
}

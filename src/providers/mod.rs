/*!
 * Transport layer for translation providers.
 *
 * Translation providers are LibreTranslate-compatible HTTP endpoints. This
 * module defines the wire types and the `Transport` trait the translation
 * client talks to, so the fallback logic can run against either:
 * - `http::HttpTransport`: real HTTP through reqwest
 * - `mock::MockTransport`: scripted responses for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

use crate::errors::ProviderError;

pub mod http;
pub mod mock;

/// Request body sent to a provider
///
/// Serialized either as JSON or as `application/x-www-form-urlencoded`
/// depending on the retry stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    /// Text to translate
    pub q: String,
    /// Source language code
    pub source: String,
    /// Target language code
    pub target: String,
    /// Always `"text"`; the pipeline never sends HTML to providers
    pub format: String,
    /// API key for providers that require one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl TranslateRequest {
    /// Create a new plain-text translation request
    pub fn new(q: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            source: source.into(),
            target: target.into(),
            format: "text".to_string(),
            api_key: None,
        }
    }

    /// Attach an API key
    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }
}

/// How the request body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
}

impl BodyEncoding {
    /// Content-Type header value for this encoding
    pub fn content_type(&self) -> &'static str {
        match self {
            BodyEncoding::Json => "application/json",
            BodyEncoding::Form => "application/x-www-form-urlencoded",
        }
    }
}

impl fmt::Display for BodyEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyEncoding::Json => write!(f, "json"),
            BodyEncoding::Form => write!(f, "form"),
        }
    }
}

/// Raw provider response: status code plus body text
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl ProviderResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Provider JSON payload; two field names are accepted for the translation
#[derive(Debug, Deserialize)]
struct TranslatePayload {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    translated: Option<String>,
}

/// Extract the translated text from a provider response.
///
/// Non-2xx statuses become `ApiError`; a 2xx body without a non-empty
/// `translatedText` or `translated` string becomes `InvalidResponse`.
pub fn extract_translation(response: &ProviderResponse) -> Result<String, ProviderError> {
    if !response.is_success() {
        return Err(ProviderError::ApiError {
            status_code: response.status,
            message: truncate(&response.body, 200),
        });
    }

    let payload: TranslatePayload = serde_json::from_str(&response.body)
        .map_err(|e| ProviderError::InvalidResponse(format!("body is not JSON: {}", e)))?;

    payload
        .translated_text
        .or(payload.translated)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing translatedText/translated field".to_string())
        })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push('…');
        cut
    }
}

/// One provider in the fallback chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Display name used in logs and attempt reports
    pub name: String,
    /// Base URL, e.g. `https://libretranslate.de`
    pub base_url: String,
    /// Whether the provider refuses requests without an API key
    #[serde(default)]
    pub requires_key: bool,
    /// API key, if configured
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProviderEndpoint {
    /// Create a keyless provider
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            requires_key: false,
            api_key: None,
        }
    }

    /// Mark the provider as requiring a key
    pub fn requires_key(mut self, requires_key: bool) -> Self {
        self.requires_key = requires_key;
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Whether an API key is present and non-empty
    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Whether the provider must be skipped because its key is missing
    pub fn is_skipped(&self) -> bool {
        self.requires_key && !self.has_key()
    }

    /// Endpoint URL variants to try, in order.
    ///
    /// A base URL already ending in `/translate` is used as is; otherwise
    /// the LibreTranslate path and the `/api` prefixed variant are tried.
    pub fn endpoint_urls(&self) -> Vec<String> {
        let base = self.base_url.trim().trim_end_matches('/');
        if base.ends_with("/translate") {
            vec![base.to_string()]
        } else {
            vec![format!("{}/translate", base), format!("{}/api/translate", base)]
        }
    }
}

/// Common trait for provider transports
///
/// Implementations perform one HTTP POST and report the raw status and body.
/// Deadline handling is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Send a translation request to `url` with the given body encoding
    async fn post(
        &self,
        url: &str,
        request: &TranslateRequest,
        encoding: BodyEncoding,
    ) -> Result<ProviderResponse, ProviderError>;
}

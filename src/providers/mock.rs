/*!
 * Mock transport implementation for testing.
 *
 * The mock routes each request by URL prefix to a scripted behavior and
 * records every call, so tests can assert both the result of the fallback
 * chain and exactly which endpoints were contacted:
 * - `MockBehavior::Status` - always answers with the given status
 * - `MockBehavior::Translate` - answers 200 with a generated translation
 * - `MockBehavior::Dictionary` - answers 200 from a lookup table
 * - `MockBehavior::RejectJson` - refuses JSON bodies, accepts form bodies
 * - `MockBehavior::ConnectionRefused` - fails before any response
 * - `MockBehavior::Slow` - delays, then behaves like the inner behavior
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{BodyEncoding, ProviderResponse, TranslateRequest, Transport};

/// Scripted behavior for one route
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always answer with this status and body
    Status { status: u16, body: String },
    /// Answer 200 with `{"translatedText": f(q)}`
    Translate(fn(&str) -> String),
    /// Answer 200 with `{"translatedText": table[q]}`, or 404 for unknown text
    Dictionary(HashMap<String, String>),
    /// Answer `status` to JSON bodies and translate form bodies with `f`
    RejectJson { status: u16, translate: fn(&str) -> String },
    /// Fail as if the host refused the connection
    ConnectionRefused,
    /// Sleep, then behave like the inner behavior
    Slow { delay_ms: u64, then: Box<MockBehavior> },
}

impl MockBehavior {
    /// Shortcut for a bare status answer
    pub fn status(status: u16) -> Self {
        MockBehavior::Status {
            status,
            body: String::new(),
        }
    }

    /// Shortcut for a 200 answer with a fixed translation
    pub fn fixed(translated: &str) -> Self {
        MockBehavior::Status {
            status: 200,
            body: json!({ "translatedText": translated }).to_string(),
        }
    }

    /// Build a dictionary behavior from pairs
    pub fn dictionary<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        MockBehavior::Dictionary(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// A recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// URL that was posted to
    pub url: String,
    /// Encoding of the body
    pub encoding: BodyEncoding,
    /// The request itself
    pub request: TranslateRequest,
}

/// Mock transport for testing provider fallback behavior
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    /// Routes checked in insertion order; first matching prefix wins
    routes: Arc<Mutex<Vec<(String, MockBehavior)>>>,
    /// Every call made through this transport
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockTransport {
    /// Create a mock with no routes; unrouted URLs answer 404
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route for every URL starting with `prefix`
    pub fn route(self, prefix: impl Into<String>, behavior: MockBehavior) -> Self {
        self.routes.lock().push((prefix.into(), behavior));
        self
    }

    /// All calls so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Number of calls whose URL starts with `prefix`
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.url.starts_with(prefix)).count()
    }

    /// Total number of calls
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Texts that were sent, in order
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.request.q.clone()).collect()
    }

    fn behavior_for(&self, url: &str) -> Option<MockBehavior> {
        self.routes
            .lock()
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, behavior)| behavior.clone())
    }

    fn respond(behavior: &MockBehavior, request: &TranslateRequest, encoding: BodyEncoding) -> Result<ProviderResponse, ProviderError> {
        match behavior {
            MockBehavior::Status { status, body } => Ok(ProviderResponse::new(*status, body.clone())),
            MockBehavior::Translate(f) => Ok(translated(f(&request.q))),
            MockBehavior::Dictionary(table) => Ok(match table.get(&request.q) {
                Some(value) => translated(value.clone()),
                None => ProviderResponse::new(404, format!("no entry for {:?}", request.q)),
            }),
            MockBehavior::RejectJson { status, translate } => Ok(match encoding {
                BodyEncoding::Json => ProviderResponse::new(*status, "json bodies are not accepted"),
                BodyEncoding::Form => translated(translate(&request.q)),
            }),
            MockBehavior::ConnectionRefused => {
                Err(ProviderError::ConnectionError("connection refused".to_string()))
            }
            // Slow is unwrapped by the caller before reaching here
            MockBehavior::Slow { then, .. } => Self::respond(then, request, encoding),
        }
    }
}

fn translated(text: String) -> ProviderResponse {
    ProviderResponse::new(200, json!({ "translatedText": text }).to_string())
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(
        &self,
        url: &str,
        request: &TranslateRequest,
        encoding: BodyEncoding,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.lock().push(MockCall {
            url: url.to_string(),
            encoding,
            request: request.clone(),
        });

        let Some(mut behavior) = self.behavior_for(url) else {
            return Ok(ProviderResponse::new(404, "Not Found"));
        };

        while let MockBehavior::Slow { delay_ms, then } = behavior {
            tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
            behavior = *then;
        }

        Self::respond(&behavior, request, encoding)
    }
}

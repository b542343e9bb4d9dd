/*!
 * Translation client with a provider fallback chain.
 *
 * Providers are tried in order. For every provider each endpoint variant is
 * tried with a JSON body first; a 401/403/406/415 answer retries the same
 * URL with a form body before moving on. Keyed providers without a key are
 * skipped outright, and a random jitter delay separates providers so a
 * failing public mirror does not get retried in lockstep.
 */

use log::{debug, error, warn};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{AttemptFailure, ProviderError, TranslationError};
use crate::providers::{BodyEncoding, ProviderEndpoint, TranslateRequest, Transport, extract_translation};
use crate::translation::cache::truncate_text;

/// Default per-call deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default jitter bounds between providers, in milliseconds
pub const DEFAULT_JITTER_MS: (u64, u64) = (150, 600);

/// A blank-line boundary: a newline followed by one or more whitespace-only lines
static PARAGRAPH_BREAK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n)+").expect("Invalid paragraph break regex"));

/// One piece of a text split on blank lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// Paragraph text, including its surrounding spaces
    Paragraph(&'a str),
    /// The blank-line run between two paragraphs
    Separator(&'a str),
}

/// Split text on blank-line boundaries; concatenating the chunks gives the input back
pub fn split_paragraphs(text: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut last = 0;

    for separator in PARAGRAPH_BREAK_REGEX.find_iter(text) {
        if separator.start() > last {
            chunks.push(Chunk::Paragraph(&text[last..separator.start()]));
        }
        chunks.push(Chunk::Separator(separator.as_str()));
        last = separator.end();
    }

    if last < text.len() {
        chunks.push(Chunk::Paragraph(&text[last..]));
    }

    chunks
}

/// Split a paragraph into leading whitespace, core and trailing whitespace
fn split_padding(paragraph: &str) -> (&str, &str, &str) {
    let start = paragraph.len() - paragraph.trim_start().len();
    let end = paragraph.trim_end().len().max(start);
    (&paragraph[..start], &paragraph[start..end], &paragraph[end..])
}

/// Whether the text has anything a translator could work on
pub(crate) fn has_letters(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Client for LibreTranslate-compatible providers
#[derive(Debug, Clone)]
pub struct TranslationClient {
    /// Providers in fallback order
    providers: Vec<ProviderEndpoint>,

    /// Transport used for every call
    transport: Arc<dyn Transport>,

    /// Deadline for a single call
    timeout: Duration,

    /// Inclusive jitter bounds between providers, in milliseconds
    jitter_ms: (u64, u64),
}

impl TranslationClient {
    /// Create a client with default timeout and jitter
    pub fn new(providers: Vec<ProviderEndpoint>, transport: Arc<dyn Transport>) -> Self {
        Self {
            providers,
            transport,
            timeout: DEFAULT_TIMEOUT,
            jitter_ms: DEFAULT_JITTER_MS,
        }
    }

    /// Set the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the jitter bounds; reversed bounds are swapped
    pub fn with_jitter(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.jitter_ms = (min_ms.min(max_ms), min_ms.max(max_ms));
        self
    }

    /// Providers in fallback order
    pub fn providers(&self) -> &[ProviderEndpoint] {
        &self.providers
    }

    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Translate text paragraph by paragraph.
    ///
    /// Blank-line separators are kept as they are, and so is the whitespace
    /// around each paragraph. Paragraphs without a single letter are not
    /// sent. Calls happen one at a time in document order; the first
    /// paragraph that exhausts the chain fails the whole text.
    pub async fn translate_paragraphs(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        let mut output = String::with_capacity(text.len() * 2);

        for chunk in split_paragraphs(text) {
            match chunk {
                Chunk::Separator(separator) => output.push_str(separator),
                Chunk::Paragraph(paragraph) => {
                    let (leading, core, trailing) = split_padding(paragraph);
                    output.push_str(leading);
                    if has_letters(core) {
                        output.push_str(&self.translate_text(core, source, target).await?);
                    } else {
                        output.push_str(core);
                    }
                    output.push_str(trailing);
                }
            }
        }

        Ok(output)
    }

    /// Send one string through the provider chain; stops at the first success
    pub async fn translate_text(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let mut attempts: Vec<AttemptFailure> = Vec::new();
        let mut contacted = 0usize;

        for provider in &self.providers {
            if provider.is_skipped() {
                debug!("Skipping provider {}: API key required but not configured", provider.name);
                continue;
            }

            if contacted > 0 {
                self.jitter().await;
            }
            contacted += 1;

            let request = TranslateRequest::new(text, source, target).api_key(provider.api_key.clone());

            match self.try_provider(provider, &request, &mut attempts).await {
                Some(translated) => {
                    debug!(
                        "Provider {} translated '{}' ({} -> {})",
                        provider.name,
                        truncate_text(text, 30),
                        source,
                        target
                    );
                    return Ok(translated);
                }
                None => warn!("Provider {} failed, falling back to the next provider", provider.name),
            }
        }

        error!(
            "All translation providers failed after {} attempt(s) for '{}'",
            attempts.len(),
            truncate_text(text, 30)
        );

        Err(TranslationError::AllProvidersExhausted { attempts })
    }

    /// Try every endpoint variant and encoding of one provider
    async fn try_provider(
        &self,
        provider: &ProviderEndpoint,
        request: &TranslateRequest,
        attempts: &mut Vec<AttemptFailure>,
    ) -> Option<String> {
        for url in provider.endpoint_urls() {
            let mut encoding = BodyEncoding::Json;

            loop {
                match self.attempt(&url, request, encoding).await {
                    Ok(translated) => return Some(translated),
                    Err(error) => {
                        debug!("{} {} ({}) failed: {}", provider.name, url, encoding, error);
                        let retry_as_form = encoding == BodyEncoding::Json && error.should_retry_as_form();
                        attempts.push(AttemptFailure {
                            provider: provider.name.clone(),
                            url: url.clone(),
                            encoding,
                            error,
                        });

                        if !retry_as_form {
                            break;
                        }
                        encoding = BodyEncoding::Form;
                    }
                }
            }
        }

        None
    }

    /// One bounded call
    async fn attempt(&self, url: &str, request: &TranslateRequest, encoding: BodyEncoding) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.timeout, self.transport.post(url, request, encoding)).await {
            Ok(Ok(response)) => extract_translation(&response),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(ProviderError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    /// Sleep a random delay within the jitter bounds
    async fn jitter(&self) {
        let (min_ms, max_ms) = self.jitter_ms;
        if max_ms == 0 {
            return;
        }

        let delay_ms = rand::rng().random_range(min_ms..=max_ms);
        debug!("Waiting {} ms before the next provider", delay_ms);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

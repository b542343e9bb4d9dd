/*!
 * Translation entry points for CMS fields.
 *
 * Two kinds of field are translated:
 * - plain fields (titles, summaries) go through the client in one piece
 * - MDX bodies are segmented first, so only prose reaches the provider
 *   and every protected construct comes back byte for byte
 *
 * Both paths gate the provider output on Arabic coverage. A plain field
 * that fails the gate is an error; an MDX body that fails it is returned
 * untranslated behind a pending marker so an editor can pick it up later.
 */

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::TranslationError;
use crate::language_utils;
use crate::segmenter::{self, Segmenter};
use crate::translation::cache::{NoCache, TranslationCache};
use crate::translation::client::{TranslationClient, has_letters};
use crate::translation::rate_limit::RateLimiter;
use crate::validation::ArabicValidator;

/// MDX comment prepended to bodies whose machine translation was rejected
pub const DEFAULT_PENDING_MARKER: &str =
    "{/* translation-pending: machine translation did not produce Arabic text */}";

/// Whether `text` starts with the default pending marker
pub fn is_pending(text: &str) -> bool {
    text.trim_start().starts_with(DEFAULT_PENDING_MARKER)
}

/// How a CMS field is translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Short text sent in one piece
    #[serde(alias = "string", alias = "text")]
    Plain,
    /// Markdown/MDX body translated segment by segment
    #[serde(alias = "markdown")]
    Mdx,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Plain => write!(f, "plain"),
            FieldKind::Mdx => write!(f, "mdx"),
        }
    }
}

impl FromStr for FieldKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "plain" | "string" | "text" => Ok(FieldKind::Plain),
            "mdx" | "markdown" => Ok(FieldKind::Mdx),
            other => Err(anyhow::anyhow!("Invalid field kind: {}", other)),
        }
    }
}

/// Coordinates segmentation, translation and validation
#[derive(Debug, Clone)]
pub struct Orchestrator {
    /// Provider chain
    client: TranslationClient,

    /// Splits MDX bodies into prose and protected spans
    segmenter: Segmenter,

    /// Acceptance gate for Arabic output
    validator: ArabicValidator,

    /// Comment prepended to rejected MDX bodies
    pending_marker: String,

    /// Storage for accepted translations
    cache: Arc<dyn TranslationCache>,

    /// Optional request gate
    rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl Orchestrator {
    /// Create an orchestrator with default segmenter, validator and marker, and no cache
    pub fn new(client: TranslationClient) -> Self {
        Self {
            client,
            segmenter: Segmenter::default(),
            validator: ArabicValidator::default(),
            pending_marker: DEFAULT_PENDING_MARKER.to_string(),
            cache: Arc::new(NoCache),
            rate_limiter: None,
        }
    }

    /// Use a custom segmenter
    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Use a custom validator
    pub fn with_validator(mut self, validator: ArabicValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Use a custom pending marker
    pub fn with_pending_marker(mut self, marker: impl Into<String>) -> Self {
        self.pending_marker = marker.into();
        self
    }

    /// Inject a translation cache
    pub fn with_cache(mut self, cache: Arc<dyn TranslationCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Inject a rate limiter
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// The underlying client
    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    /// The configured pending marker
    pub fn pending_marker(&self) -> &str {
        &self.pending_marker
    }

    /// Whether `text` carries this orchestrator's pending marker
    pub fn is_pending(&self, text: &str) -> bool {
        text.trim_start().starts_with(&self.pending_marker)
    }

    /// Remove a leading pending marker and the blank line after it
    pub fn strip_pending_marker<'a>(&self, text: &'a str) -> &'a str {
        let trimmed = text.trim_start();
        match trimmed.strip_prefix(self.pending_marker.as_str()) {
            Some(rest) => rest.strip_prefix("\n\n").or_else(|| rest.strip_prefix('\n')).unwrap_or(rest),
            None => text,
        }
    }

    /// Translate a field according to its kind
    pub async fn translate_field(
        &self,
        kind: FieldKind,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        match kind {
            FieldKind::Plain => self.translate_plain(text, source, target).await,
            FieldKind::Mdx => self.translate_mdx_preserving(text, source, target).await,
        }
    }

    /// Translate a plain field in one piece.
    ///
    /// Text that already reads as Arabic is returned unchanged. Output that
    /// fails the Arabic gate is an error, never a silent English fallback.
    pub async fn translate_plain(&self, text: &str, source: &str, target: &str) -> Result<String, TranslationError> {
        self.check_rate_limit()?;

        let gated = self.gates_arabic(target);
        if !has_letters(text) || (gated && self.validator.accepts(text)) {
            debug!("Plain field needs no translation");
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.get(text, source, target) {
            return Ok(cached);
        }

        let translated = self
            .client
            .translate_text(text, source, target)
            .await
            .map_err(unavailable)?;

        if gated && !self.validator.accepts(&translated) {
            let coverage = self.validator.coverage(&translated);
            warn!(
                "Rejected plain translation: Arabic coverage {:.2} below {:.2}",
                coverage, self.validator.threshold
            );
            return Err(TranslationError::NonArabicOutput {
                coverage,
                threshold: self.validator.threshold,
            });
        }

        self.cache.store(text, source, target, &translated);
        Ok(translated)
    }

    /// Translate an MDX body, leaving every protected construct intact.
    ///
    /// Bodies without prose, or whose prose is already Arabic, come back
    /// unchanged. When the combined translated prose fails the Arabic gate
    /// the untranslated body is returned behind the pending marker.
    pub async fn translate_mdx_preserving(
        &self,
        mdx: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        self.check_rate_limit()?;

        let body = self.strip_pending_marker(mdx);
        let segmentation = self.segmenter.segment_with_warnings(body);
        let prose = segmenter::translatable_text(&segmentation.segments);

        if !has_letters(&prose) {
            debug!("MDX body has no translatable prose");
            return Ok(mdx.to_string());
        }

        let gated = self.gates_arabic(target);
        if gated && self.validator.accepts(&prose) {
            debug!("MDX body is already Arabic");
            return Ok(mdx.to_string());
        }

        if let Some(cached) = self.cache.get(body, source, target) {
            return Ok(cached);
        }

        let mut output = String::with_capacity(body.len() * 2);
        let mut translated_prose = String::new();
        let mut translated_segments = 0usize;

        for segment in &segmentation.segments {
            if !segment.translate {
                output.push_str(&segment.text);
                continue;
            }

            let translated = self
                .client
                .translate_paragraphs(&segment.text, source, target)
                .await
                .map_err(unavailable)?;

            translated_prose.push_str(&translated);
            output.push_str(&translated);
            translated_segments += 1;
        }

        if gated && !self.validator.accepts(&translated_prose) {
            warn!(
                "Machine translation did not produce Arabic text (coverage {:.2}), marking body as pending",
                self.validator.coverage(&translated_prose)
            );
            return Ok(format!("{}\n\n{}", self.pending_marker, body));
        }

        info!(
            "Translated MDX body: {} segment(s), {} protected",
            translated_segments,
            segmentation.segments.len() - translated_segments
        );

        self.cache.store(body, source, target, &output);
        Ok(output)
    }

    /// The Arabic gate only applies to Arabic targets
    fn gates_arabic(&self, target: &str) -> bool {
        language_utils::is_arabic(target)
    }

    fn check_rate_limit(&self) -> Result<(), TranslationError> {
        match &self.rate_limiter {
            Some(limiter) => limiter.check(),
            None => Ok(()),
        }
    }
}

/// Wrap a provider-chain failure in the single user-facing error
fn unavailable(error: TranslationError) -> TranslationError {
    match error {
        TranslationError::AllProvidersExhausted { .. } => {
            TranslationError::TranslationUnavailable(Box::new(error))
        }
        other => other,
    }
}

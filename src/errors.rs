/*!
 * Error types for the mdxlate library.
 *
 * This module contains custom error types for the translation pipeline,
 * using the thiserror crate for ergonomic error definitions.
 *
 * - `ProviderError`: a single HTTP attempt against one provider endpoint
 * - `TranslationError`: what a translation entry point reports to its caller
 * - `SegmentationDegraded`: a recoverable warning from the segmenter
 * - `AppError`: the top-level error for the command line application
 */

use std::fmt;

use thiserror::Error;

use crate::providers::BodyEncoding;

/// Errors that can occur during a single request to a translation provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The request could not be sent or the body could not be read
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The provider answered with a non-success status
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The request exceeded its deadline and was abandoned
    #[error("Request timed out after {after_ms} ms")]
    Timeout {
        /// Deadline that elapsed, in milliseconds
        after_ms: u64,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A 2xx response without a usable translated-text field
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether the same endpoint should be retried with a form-encoded body.
    ///
    /// Some LibreTranslate deployments reject JSON bodies (406/415) or only
    /// read the API key from form fields (401/403).
    pub fn should_retry_as_form(&self) -> bool {
        matches!(
            self,
            ProviderError::ApiError { status_code: 401 | 403 | 406 | 415, .. }
        )
    }

    /// HTTP status attached to this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::ApiError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// One failed attempt in the provider fallback chain
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    /// Provider display name
    pub provider: String,
    /// Full URL that was called
    pub url: String,
    /// Body encoding used for the attempt
    pub encoding: BodyEncoding,
    /// What went wrong
    pub error: ProviderError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({}): {}", self.provider, self.url, self.encoding, self.error)
    }
}

/// Errors that can occur during translation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Every provider, endpoint and encoding combination failed
    #[error("translation service unavailable")]
    AllProvidersExhausted {
        /// Every failed attempt, in the order they were made
        attempts: Vec<AttemptFailure>,
    },

    /// A provider failure surfaced by one of the orchestrator entry points
    #[error("translation service unavailable")]
    TranslationUnavailable(#[source] Box<TranslationError>),

    /// The provider answered, but the output is not Arabic enough
    #[error("translation output is not Arabic (coverage {coverage:.2} < {threshold:.2})")]
    NonArabicOutput {
        /// Measured Arabic coverage of the output
        coverage: f64,
        /// Threshold the output had to reach
        threshold: f64,
    },

    /// The injected rate limiter refused the request
    #[error("too many translation requests, retry in {retry_after_secs} s")]
    RateLimited {
        /// Seconds until the current window resets
        retry_after_secs: u64,
    },
}

impl TranslationError {
    /// All failed provider attempts behind this error, if it came from the chain
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            TranslationError::AllProvidersExhausted { attempts } => attempts,
            TranslationError::TranslationUnavailable(inner) => inner.attempts(),
            _ => &[],
        }
    }

    /// Whether this error means no provider could be reached
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            TranslationError::AllProvidersExhausted { .. } | TranslationError::TranslationUnavailable(_)
        )
    }

    /// Multi-line report of every attempt, for logs rather than users
    pub fn attempt_report(&self) -> String {
        self.attempts()
            .iter()
            .enumerate()
            .map(|(i, attempt)| format!("  {}. {}", i + 1, attempt))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Recoverable segmentation problem: an unterminated protected construct.
///
/// The remainder of the input starting at `offset` was protected as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationDegraded {
    /// Byte offset where the unterminated construct starts
    pub offset: usize,
    /// Short description of the construct, e.g. `<Cite`
    pub construct: String,
}

impl fmt::Display for SegmentationDegraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unterminated {} at byte {}, protecting the rest of the input",
            self.construct, self.offset
        )
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

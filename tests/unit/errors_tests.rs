/*!
 * Tests for error types and their user-facing messages
 */

use mdxlate::errors::{AppError, AttemptFailure, ProviderError, TranslationError};
use mdxlate::providers::BodyEncoding;

fn attempt(status_code: u16) -> AttemptFailure {
    AttemptFailure {
        provider: "primary".to_string(),
        url: "https://primary.test/translate".to_string(),
        encoding: BodyEncoding::Json,
        error: ProviderError::ApiError {
            status_code,
            message: "nope".to_string(),
        },
    }
}

#[test]
fn test_exhausted_error_should_hide_attempts_from_display() {
    let error = TranslationError::AllProvidersExhausted {
        attempts: vec![attempt(404), attempt(500)],
    };
    assert_eq!(error.to_string(), "translation service unavailable");
    assert_eq!(error.attempts().len(), 2);

    let report = error.attempt_report();
    assert!(report.contains("1. primary https://primary.test/translate (json)"));
    assert!(report.contains("500"));
}

#[test]
fn test_unavailable_error_should_expose_inner_attempts() {
    let inner = TranslationError::AllProvidersExhausted {
        attempts: vec![attempt(404)],
    };
    let error = TranslationError::TranslationUnavailable(Box::new(inner));
    assert!(error.is_unavailable());
    assert_eq!(error.attempts().len(), 1);
    assert_eq!(error.to_string(), "translation service unavailable");
}

#[test]
fn test_should_retry_as_form_only_for_encoding_statuses() {
    for status in [401, 403, 406, 415] {
        assert!(attempt(status).error.should_retry_as_form(), "{}", status);
    }
    for status in [400, 404, 429, 500] {
        assert!(!attempt(status).error.should_retry_as_form(), "{}", status);
    }
    assert!(!ProviderError::Timeout { after_ms: 10 }.should_retry_as_form());
}

#[test]
fn test_non_arabic_error_should_report_coverage() {
    let error = TranslationError::NonArabicOutput {
        coverage: 0.04,
        threshold: 0.15,
    };
    assert!(!error.is_unavailable());
    assert!(error.to_string().contains("0.04 < 0.15"));
}

#[test]
fn test_app_error_should_wrap_library_errors() {
    let error: AppError = TranslationError::RateLimited { retry_after_secs: 3 }.into();
    assert!(error.to_string().starts_with("Translation error:"));

    let error: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, AppError::File(_)));
}

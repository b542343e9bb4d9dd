/*!
 * Provider fallback chain tests against the scripted transport
 */

use std::time::Duration;

use mdxlate::errors::{ProviderError, TranslationError};
use mdxlate::providers::mock::{MockBehavior, MockTransport};
use mdxlate::providers::{BodyEncoding, ProviderEndpoint};
use mdxlate::translation::Orchestrator;

use crate::common::{FALLBACK_URL, PRIMARY_URL, client_for};

fn to_arabic(_text: &str) -> String {
    "مرحبا".to_string()
}

fn chain() -> Vec<ProviderEndpoint> {
    vec![
        ProviderEndpoint::new("primary", PRIMARY_URL),
        ProviderEndpoint::new("fallback", FALLBACK_URL),
    ]
}

#[tokio::test]
async fn test_translate_plain_with_failing_primary_should_use_fallback() {
    let transport = MockTransport::new()
        .route(PRIMARY_URL, MockBehavior::status(404))
        .route(FALLBACK_URL, MockBehavior::fixed("مرحبا"));
    let orchestrator = Orchestrator::new(client_for(&transport, chain()));

    let result = orchestrator.translate_plain("Hello", "en", "ar").await.unwrap();

    assert_eq!(result, "مرحبا");
    // Both primary path variants fail, the first fallback call succeeds
    assert_eq!(transport.calls_to(PRIMARY_URL), 2);
    assert_eq!(transport.calls_to(FALLBACK_URL), 1);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_translate_text_with_working_primary_should_not_contact_fallback() {
    let transport = MockTransport::new()
        .route(PRIMARY_URL, MockBehavior::fixed("مرحبا"))
        .route(FALLBACK_URL, MockBehavior::fixed("unused"));
    let client = client_for(&transport, chain());

    assert_eq!(client.translate_text("Hello", "en", "ar").await.unwrap(), "مرحبا");
    assert_eq!(transport.calls_to(FALLBACK_URL), 0);
}

#[tokio::test]
async fn test_translate_text_with_keyless_keyed_provider_should_skip_it() {
    let transport = MockTransport::new()
        .route("https://keyed.test", MockBehavior::fixed("unused"))
        .route(FALLBACK_URL, MockBehavior::fixed("مرحبا"));
    let providers = vec![
        ProviderEndpoint::new("keyed", "https://keyed.test").requires_key(true),
        ProviderEndpoint::new("fallback", FALLBACK_URL),
    ];
    let client = client_for(&transport, providers);

    assert_eq!(client.translate_text("Hello", "en", "ar").await.unwrap(), "مرحبا");
    assert_eq!(transport.calls_to("https://keyed.test"), 0);
}

#[tokio::test]
async fn test_translate_text_with_keyed_provider_should_send_key() {
    let transport = MockTransport::new().route("https://keyed.test", MockBehavior::fixed("مرحبا"));
    let providers = vec![
        ProviderEndpoint::new("keyed", "https://keyed.test")
            .requires_key(true)
            .with_api_key("secret"),
    ];
    let client = client_for(&transport, providers);

    client.translate_text("Hello", "en", "ar").await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request.api_key.as_deref(), Some("secret"));
}

#[tokio::test]
async fn test_translate_text_with_json_rejected_should_retry_same_url_as_form() {
    let transport = MockTransport::new().route(
        PRIMARY_URL,
        MockBehavior::RejectJson {
            status: 415,
            translate: to_arabic,
        },
    );
    let client = client_for(&transport, vec![ProviderEndpoint::new("primary", PRIMARY_URL)]);

    assert_eq!(client.translate_text("Hello", "en", "ar").await.unwrap(), "مرحبا");

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].encoding, BodyEncoding::Json);
    assert_eq!(calls[1].encoding, BodyEncoding::Form);
    assert_eq!(calls[0].url, calls[1].url);
}

#[tokio::test]
async fn test_translate_text_with_slow_primary_should_time_out_and_fall_back() {
    let transport = MockTransport::new()
        .route(
            PRIMARY_URL,
            MockBehavior::Slow {
                delay_ms: 2_000,
                then: Box::new(MockBehavior::fixed("too late")),
            },
        )
        .route(FALLBACK_URL, MockBehavior::fixed("مرحبا"));
    let providers = vec![
        ProviderEndpoint::new("primary", format!("{}/translate", PRIMARY_URL)),
        ProviderEndpoint::new("fallback", FALLBACK_URL),
    ];
    let client = client_for(&transport, providers).with_timeout(Duration::from_millis(50));

    assert_eq!(client.translate_text("Hello", "en", "ar").await.unwrap(), "مرحبا");
}

#[tokio::test]
async fn test_translate_plain_with_every_provider_down_should_report_unavailable() {
    let transport = MockTransport::new()
        .route(PRIMARY_URL, MockBehavior::ConnectionRefused)
        .route(FALLBACK_URL, MockBehavior::status(503));
    let orchestrator = Orchestrator::new(client_for(&transport, chain()));

    let error = orchestrator.translate_plain("Hello", "en", "ar").await.unwrap_err();

    assert!(error.is_unavailable());
    assert_eq!(error.to_string(), "translation service unavailable");
    assert_eq!(error.attempts().len(), 4);
    assert!(matches!(error.attempts()[0].error, ProviderError::ConnectionError(_)));
    assert_eq!(error.attempts()[3].error.status_code(), Some(503));

    let report = error.attempt_report();
    assert!(report.contains("primary"));
    assert!(report.contains("fallback"));
    assert!(report.contains("503"));
}

#[tokio::test]
async fn test_translate_plain_with_english_output_should_refuse_it() {
    let transport = MockTransport::new().route(PRIMARY_URL, MockBehavior::fixed("Hello again"));
    let orchestrator = Orchestrator::new(client_for(
        &transport,
        vec![ProviderEndpoint::new("primary", PRIMARY_URL)],
    ));

    let error = orchestrator.translate_plain("Hello", "en", "ar").await.unwrap_err();

    assert!(matches!(error, TranslationError::NonArabicOutput { .. }));
    assert!(!error.is_unavailable());
}

#[tokio::test]
async fn test_translate_plain_with_malformed_success_body_should_fall_back() {
    let transport = MockTransport::new()
        .route(
            PRIMARY_URL,
            MockBehavior::Status {
                status: 200,
                body: "{\"unexpected\": true}".to_string(),
            },
        )
        .route(FALLBACK_URL, MockBehavior::fixed("مرحبا"));
    let orchestrator = Orchestrator::new(client_for(&transport, chain()));

    assert_eq!(orchestrator.translate_plain("Hello", "en", "ar").await.unwrap(), "مرحبا");
    assert_eq!(transport.calls_to(PRIMARY_URL), 2);
}

/*!
 * End-to-end MDX translation tests against the scripted transport
 */

use std::sync::Arc;

use mdxlate::providers::mock::{MockBehavior, MockTransport};
use mdxlate::segmenter::Segmenter;
use mdxlate::translation::{DEFAULT_PENDING_MARKER, FieldKind, MemoryCache, is_pending};

use crate::common::{PRIMARY_URL, arabic_dictionary, orchestrator_for, sample_chapter};

fn echo(text: &str) -> String {
    text.to_string()
}

#[tokio::test]
async fn test_translate_mdx_with_inline_cite_should_keep_tag_in_place() {
    let transport = MockTransport::new().route(PRIMARY_URL, arabic_dictionary());
    let orchestrator = orchestrator_for(&transport);

    let result = orchestrator
        .translate_mdx_preserving(r#"Hello <Cite id="x"/> world"#, "en", "ar")
        .await
        .unwrap();

    assert_eq!(result, r#"مرحبا <Cite id="x"/> العالم"#);
    assert_eq!(transport.sent_texts(), vec!["Hello".to_string(), "world".to_string()]);
}

#[tokio::test]
async fn test_translate_mdx_with_sample_chapter_should_keep_protected_parts() {
    let transport = MockTransport::new().route(PRIMARY_URL, arabic_dictionary());
    let orchestrator = orchestrator_for(&transport);

    let result = orchestrator
        .translate_mdx_preserving(sample_chapter(), "en", "ar")
        .await
        .unwrap();

    assert!(!is_pending(&result));
    assert!(result.starts_with("---\ntitle: Village history\n---\n"));
    assert!(result.contains("import Map from '../components/Map'\n"));
    assert!(result.contains("# مرحبا\n"));
    assert!(result.contains(r#"مرحبا <Cite id="x"/> العالم"#));
    assert!(result.contains("```js\nconst world = \"Hello\";\n```"));

    // Nothing protected was sent to the provider
    for sent in transport.sent_texts() {
        assert!(!sent.contains("title"));
        assert!(!sent.contains("import"));
        assert!(!sent.contains("const"));
        assert!(!sent.contains('<'));
    }
}

#[tokio::test]
async fn test_translate_mdx_with_english_output_should_mark_body_pending() {
    let transport = MockTransport::new().route(PRIMARY_URL, MockBehavior::Translate(echo));
    let orchestrator = orchestrator_for(&transport);
    let body = "Hello world\n\nA second paragraph.";

    let result = orchestrator.translate_mdx_preserving(body, "en", "ar").await.unwrap();

    assert_eq!(result, format!("{}\n\n{}", DEFAULT_PENDING_MARKER, body));
    assert!(is_pending(&result));
}

#[tokio::test]
async fn test_translate_mdx_of_pending_body_should_replace_marker() {
    let transport = MockTransport::new().route(PRIMARY_URL, arabic_dictionary());
    let orchestrator = orchestrator_for(&transport);
    let pending = format!("{}\n\n{}", DEFAULT_PENDING_MARKER, r#"Hello <Cite id="x"/> world"#);

    let result = orchestrator.translate_mdx_preserving(&pending, "en", "ar").await.unwrap();

    assert_eq!(result, r#"مرحبا <Cite id="x"/> العالم"#);
}

#[tokio::test]
async fn test_translate_mdx_with_arabic_body_should_not_call_provider() {
    let transport = MockTransport::new().route(PRIMARY_URL, arabic_dictionary());
    let orchestrator = orchestrator_for(&transport);
    let body = "مرحبا <Cite id=\"x\"/> بالعالم\n\n```js\nconst a = 1;\n```\n";

    let result = orchestrator.translate_mdx_preserving(body, "en", "ar").await.unwrap();

    assert_eq!(result, body);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_translate_mdx_with_only_code_should_pass_through() {
    let transport = MockTransport::new().route(PRIMARY_URL, arabic_dictionary());
    let orchestrator = orchestrator_for(&transport);
    let body = "```python\nprint('hello')\n```\n";

    let result = orchestrator.translate_mdx_preserving(body, "en", "ar").await.unwrap();

    assert_eq!(result, body);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_translate_mdx_with_custom_allowlist_should_protect_new_tag() {
    let transport = MockTransport::new().route(PRIMARY_URL, arabic_dictionary());
    let orchestrator =
        orchestrator_for(&transport).with_segmenter(Segmenter::new(vec!["Gallery".to_string()]));

    let result = orchestrator
        .translate_mdx_preserving(r#"Hello <Gallery ids="a b"/> world"#, "en", "ar")
        .await
        .unwrap();

    assert_eq!(result, r#"مرحبا <Gallery ids="a b"/> العالم"#);
}

#[tokio::test]
async fn test_translate_mdx_with_non_arabic_target_should_skip_arabic_gate() {
    let transport = MockTransport::new().route(PRIMARY_URL, MockBehavior::fixed("Bonjour"));
    let orchestrator = orchestrator_for(&transport);

    let result = orchestrator.translate_mdx_preserving("Hello", "en", "fr").await.unwrap();

    assert_eq!(result, "Bonjour");
}

#[tokio::test]
async fn test_translate_field_should_dispatch_by_kind() {
    let transport = MockTransport::new().route(PRIMARY_URL, arabic_dictionary());
    let orchestrator = orchestrator_for(&transport);

    let plain = orchestrator
        .translate_field(FieldKind::Plain, "Hello world", "en", "ar")
        .await
        .unwrap();
    let mdx = orchestrator
        .translate_field(FieldKind::Mdx, r#"Hello <Cite id="x"/> world"#, "en", "ar")
        .await
        .unwrap();

    assert_eq!(plain, "مرحبا بالعالم");
    assert_eq!(mdx, r#"مرحبا <Cite id="x"/> العالم"#);
}

#[tokio::test]
async fn test_translate_mdx_with_cache_should_reuse_previous_result() {
    let transport = MockTransport::new().route(PRIMARY_URL, arabic_dictionary());
    let cache = Arc::new(MemoryCache::new());
    let orchestrator = orchestrator_for(&transport).with_cache(cache.clone());
    let body = r#"Hello <Cite id="x"/> world"#;

    let first = orchestrator.translate_mdx_preserving(body, "en", "ar").await.unwrap();
    let calls_after_first = transport.call_count();
    let second = orchestrator.translate_mdx_preserving(body, "en", "ar").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.call_count(), calls_after_first);
    assert_eq!(cache.len(), 1);
}

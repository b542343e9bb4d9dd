/*!
 * Controller workflow tests: files in, translated files out
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use mdxlate::app_config::Config;
use mdxlate::app_controller::{Controller, FileOutcome, FolderSummary};
use mdxlate::errors::AppError;
use mdxlate::providers::mock::{MockBehavior, MockTransport};
use mdxlate::translation::{DEFAULT_PENDING_MARKER, FieldKind};

use crate::common::{
    PRIMARY_URL, arabic_dictionary, create_temp_dir, create_test_file, init_test_logging, test_config,
};

fn echo(text: &str) -> String {
    text.to_string()
}

fn controller_with(behavior: MockBehavior) -> Result<(Controller, MockTransport)> {
    init_test_logging();
    let transport = MockTransport::new().route(PRIMARY_URL, behavior);
    let controller = Controller::with_transport(test_config(), Arc::new(transport.clone()))?;
    Ok((controller, transport))
}

#[tokio::test]
async fn test_translate_file_should_write_sibling_output() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "chapter.mdx", r#"Hello <Cite id="x"/> world"#)?;
    let (controller, _) = controller_with(arabic_dictionary())?;

    let outcome = controller.translate_file(&input, None, FieldKind::Mdx, false).await?;

    let expected = temp_dir.path().join("chapter.ar.mdx");
    assert_eq!(outcome, FileOutcome::Translated(expected.clone()));
    assert_eq!(fs::read_to_string(&expected)?, r#"مرحبا <Cite id="x"/> العالم"#);
    Ok(())
}

#[tokio::test]
async fn test_translate_file_twice_should_skip_unless_forced() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "chapter.mdx", "Hello world")?;
    let (controller, transport) = controller_with(arabic_dictionary())?;

    controller.translate_file(&input, None, FieldKind::Mdx, false).await?;
    let calls_after_first = transport.call_count();

    let second = controller.translate_file(&input, None, FieldKind::Mdx, false).await?;
    assert!(matches!(second, FileOutcome::Skipped(_)));
    assert_eq!(transport.call_count(), calls_after_first);

    let output = temp_dir.path().join("chapter.ar.mdx");
    fs::write(&output, "stale")?;
    let forced = controller.translate_file(&input, None, FieldKind::Mdx, true).await?;
    assert_eq!(forced, FileOutcome::Translated(output.clone()));
    assert_eq!(fs::read_to_string(&output)?, "مرحبا بالعالم");
    Ok(())
}

#[tokio::test]
async fn test_translate_file_with_english_output_should_write_pending_body() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "chapter.mdx", "Hello world")?;
    let (controller, _) = controller_with(MockBehavior::Translate(echo))?;

    let outcome = controller.translate_file(&input, None, FieldKind::Mdx, false).await?;

    let output = temp_dir.path().join("chapter.ar.mdx");
    assert_eq!(outcome, FileOutcome::Pending(output.clone()));
    assert_eq!(
        fs::read_to_string(&output)?,
        format!("{}\n\nHello world", DEFAULT_PENDING_MARKER)
    );
    Ok(())
}

#[tokio::test]
async fn test_translate_file_as_plain_field_should_use_explicit_output() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "title.md", "Hello world")?;
    let output = temp_dir.path().join("out/title.txt");
    let (controller, _) = controller_with(arabic_dictionary())?;

    let outcome = controller
        .translate_file(&input, Some(output.clone()), FieldKind::Plain, false)
        .await?;

    assert_eq!(outcome, FileOutcome::Translated(output.clone()));
    assert_eq!(fs::read_to_string(&output)?, "مرحبا بالعالم");
    Ok(())
}

#[tokio::test]
async fn test_translate_file_with_providers_down_should_fail_without_output() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "chapter.mdx", "Hello world")?;
    let (controller, _) = controller_with(MockBehavior::status(503))?;

    let result = controller.translate_file(&input, None, FieldKind::Mdx, false).await;

    let error = result.unwrap_err();
    assert!(format!("{:#}", error).contains("translation service unavailable"));
    match error.downcast_ref::<AppError>() {
        Some(AppError::Translation(inner)) => assert!(inner.is_unavailable()),
        other => panic!("expected a translation error, got {:?}", other),
    }
    assert!(!temp_dir.path().join("chapter.ar.mdx").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_folder_should_count_every_outcome() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    create_test_file(temp_dir.path(), "a.mdx", r#"Hello <Cite id="x"/> world"#)?;
    create_test_file(temp_dir.path(), "nested/b.md", "Hello world")?;
    create_test_file(temp_dir.path(), "c.mdx", "Goodbye")?;
    create_test_file(temp_dir.path(), "d.mdx", "Hello")?;
    create_test_file(temp_dir.path(), "d.ar.mdx", "مرحبا")?;
    create_test_file(temp_dir.path(), "notes.txt", "Hello")?;
    let (controller, _) = controller_with(arabic_dictionary())?;

    let summary = controller.run_folder(temp_dir.path(), false).await?;

    assert_eq!(
        summary,
        FolderSummary {
            translated: 2,
            pending: 0,
            skipped: 1,
            failed: 1,
        }
    );
    assert!(temp_dir.path().join("nested/b.ar.md").exists());
    assert!(!temp_dir.path().join("c.ar.mdx").exists());
    assert_eq!(fs::read_to_string(temp_dir.path().join("d.ar.mdx"))?, "مرحبا");
    Ok(())
}

#[tokio::test]
async fn test_run_folder_without_documents_should_fail() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    create_test_file(temp_dir.path(), "notes.txt", "Hello")?;
    let (controller, _) = controller_with(arabic_dictionary())?;

    assert!(controller.run_folder(temp_dir.path(), false).await.is_err());
    Ok(())
}

#[test]
fn test_controller_with_invalid_config_should_fail() {
    let mut config = test_config();
    config.validation.arabic_threshold = 0.0;

    let result = Controller::with_transport(config, Arc::new(MockTransport::new()));

    assert!(result.is_err());
}

#[test]
fn test_controller_should_expose_config_and_pipeline() -> Result<()> {
    let mut config: Config = test_config();
    config.validation.pending_marker = "{/* needs review */}".to_string();
    let controller = Controller::with_transport(config, Arc::new(MockTransport::new()))?;

    assert_eq!(controller.config().target_language, "ar");
    assert_eq!(controller.orchestrator().pending_marker(), "{/* needs review */}");
    assert_eq!(controller.orchestrator().client().providers().len(), 1);
    Ok(())
}

#[test]
fn test_segments_json_should_list_protected_spans() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "chapter.mdx", r#"Hello <Cite id="x"/> world"#)?;
    let controller = Controller::with_transport(test_config(), Arc::new(MockTransport::new()))?;

    let json: serde_json::Value = serde_json::from_str(&controller.segments_json(&input)?)?;

    let segments = json.as_array().expect("segments array");
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[1]["text"], r#"<Cite id="x"/>"#);
    assert_eq!(segments[1]["translate"], false);
    assert_eq!(segments[0]["translate"], true);
    Ok(())
}

#[test]
fn test_to_html_then_to_markdown_should_round_trip() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "chapter.mdx", "# Title\n\nSome **bold** text")?;
    let controller = Controller::with_transport(test_config(), Arc::new(MockTransport::new()))?;

    let html = controller.to_html(&input)?;
    assert_eq!(html, "<h1>Title</h1>\n<p>Some <strong>bold</strong> text</p>\n");

    let html_file = create_test_file(temp_dir.path(), "chapter.html", &html)?;
    assert_eq!(controller.to_markdown(&html_file)?, "# Title\n\nSome **bold** text");
    Ok(())
}

#[test]
fn test_to_html_then_to_markdown_should_restore_custom_elements() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "chapter.mdx", "Hello <Cite id=\"x\"/> world")?;
    let controller = Controller::with_transport(test_config(), Arc::new(MockTransport::new()))?;

    let html = controller.to_html(&input)?;
    assert!(html.contains("<script type=\"application/json\" data-mdx-placeholders>"));

    let html_file = create_test_file(temp_dir.path(), "chapter.html", &html)?;
    assert_eq!(controller.to_markdown(&html_file)?, "Hello <Cite id=\"x\"/> world");
    Ok(())
}

#[test]
fn test_translate_file_from_blocking_context_should_complete() -> Result<()> {
    let temp_dir = create_temp_dir()?;
    let input = create_test_file(temp_dir.path(), "chapter.md", "Hello")?;
    let (controller, _) = controller_with(arabic_dictionary())?;

    let outcome = tokio_test::block_on(async {
        controller.translate_file(&input, None, FieldKind::Mdx, false).await
    })?;

    assert_eq!(outcome, FileOutcome::Translated(temp_dir.path().join("chapter.ar.md")));
    Ok(())
}

/*!
 * Editor load/save round trips over whole documents
 */

use mdxlate::editor::{html_to_markdown, load_for_editing, normalize_markdown, save_from_editor};

/// A document already in canonical form
const CHAPTER: &str = "# Village history

The village had a **mosque** and a *school* near the [market](https://example.org/market) <Cite id=\"h1977\"/>.

- olive groves
  - terraced plots
- wells on the `northern` slope

> Oral testimony.<Footnote>Interview, tape **4**.</Footnote>

| Year | Population |
| --- | --- |
| 1922 | 1,204 |

```json
{\"source\": \"census\"}
```";

#[test]
fn test_normalize_markdown_with_canonical_document_should_be_identity() {
    assert_eq!(normalize_markdown(CHAPTER), CHAPTER);
}

#[test]
fn test_load_then_save_without_edits_should_reproduce_document() {
    let (html, placeholders) = load_for_editing(CHAPTER);

    assert_eq!(placeholders.len(), 2);
    assert!(!html.contains("<Cite"));
    assert!(!html.contains("<Footnote"));
    assert!(html.contains("<h1>Village history</h1>"));

    assert_eq!(save_from_editor(&html, &placeholders), CHAPTER);
}

#[test]
fn test_save_after_text_edit_should_keep_custom_elements() {
    let (html, placeholders) = load_for_editing(CHAPTER);
    let edited = html.replace("olive groves", "بساتين الزيتون");

    let saved = save_from_editor(&edited, &placeholders);

    assert!(saved.contains("- بساتين الزيتون\n  - terraced plots"));
    assert!(saved.contains("<Cite id=\"h1977\"/>"));
    assert!(saved.contains("<Footnote>Interview, tape **4**.</Footnote>"));
}

#[test]
fn test_normalize_markdown_should_canonicalize_markup_variants() {
    let markdown = "Title\n\n* one\n* two\n\n__strong__ and _em_ <Cite id=\"x\"/>";
    let normalized = normalize_markdown(markdown);

    assert_eq!(normalized, "Title\n\n- one\n- two\n\n**strong** and *em* <Cite id=\"x\"/>");
    assert_eq!(normalize_markdown(&normalized), normalized);
}

#[test]
fn test_html_to_markdown_with_foreign_editor_markup_should_convert() {
    let html = "<div><h2>Notes</h2><div>first <b>bold</b> line</div><ol start=\"2\"><li>two</li><li>three</li></ol></div>";

    assert_eq!(html_to_markdown(html), "## Notes\n\nfirst **bold** line\n\n2. two\n3. three");
}

#[test]
fn test_normalize_markdown_with_one_line_backtick_run_should_keep_following_prose() {
    let markdown = "```npm install```\n\nNext paragraph stays prose";

    assert_eq!(normalize_markdown(markdown), "`npm install`\n\nNext paragraph stays prose");
}

#[test]
fn test_editor_save_should_keep_fence_meta() {
    let markdown = "Intro\n\n```js title=\"app.js\" {1,3}\nlet a = 1;\n```";

    assert_eq!(normalize_markdown(markdown), markdown);

    let (html, placeholders) = load_for_editing(markdown);
    assert_eq!(save_from_editor(&html, &placeholders), markdown);
}

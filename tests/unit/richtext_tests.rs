/*!
 * Tests for the Markdown/rich-text converter and its HTML adapter
 */

use mdxlate::placeholder::PlaceholderMap;
use mdxlate::richtext::{
    Block, Inline, List, ListItem, parse_html, parse_markdown, render_html, round_trip, serialize_markdown,
};

/// Serialize, reparse and serialize again: the two serializations must agree
fn assert_idempotent(markdown: &str) {
    let once = round_trip(markdown);
    assert_eq!(round_trip(&once), once, "second round trip changed {:?}", markdown);
}

#[test]
fn test_round_trip_with_three_level_list_should_be_canonical() {
    let markdown = "- a\n  - b\n    - c\n- d";
    assert_eq!(round_trip(markdown), markdown);

    let doc = parse_markdown(markdown);
    let Block::List(outer) = &doc.blocks[0] else {
        panic!("expected a list, got {:?}", doc.blocks[0]);
    };
    assert_eq!(outer.items.len(), 2);
    let Block::List(middle) = &outer.items[0].children[0] else {
        panic!("expected a nested list");
    };
    assert_eq!(middle.items[0].children.len(), 1);
}

#[test]
fn test_round_trip_with_ragged_table_should_pad_and_truncate() {
    let markdown = "| A | B |\n|---|:-:|\n| 1 |\n| 1 | 2 | 3 |";
    assert_eq!(round_trip(markdown), "| A | B |\n| --- | --- |\n| 1 |  |\n| 1 | 2 |");
    assert_idempotent(markdown);
}

#[test]
fn test_round_trip_with_fenced_code_should_keep_language_and_body() {
    let markdown = "```python\nprint(\"*not emphasis*\")\n```";
    assert_eq!(round_trip(markdown), markdown);
    assert_eq!(
        parse_markdown(markdown).blocks,
        vec![Block::CodeBlock {
            language: Some("python".to_string()),
            meta: None,
            code: "print(\"*not emphasis*\")".to_string(),
        }]
    );
}

#[test]
fn test_round_trip_with_mixed_emphasis_should_be_stable() {
    for markdown in [
        "**bold *inner* bold**",
        "*it **b** it*",
        "~~**struck bold**~~",
        "***both***",
        "a * b * c",
    ] {
        assert_idempotent(markdown);
    }
    assert_eq!(round_trip("**bold *inner* bold**"), "**bold *inner* bold**");
}

#[test]
fn test_parse_markdown_with_placeholder_should_yield_foreign_inline() {
    let doc = parse_markdown("Hello ⟦MDX_1⟧ world");
    assert_eq!(
        doc.blocks,
        vec![Block::Paragraph(vec![
            Inline::text("Hello "),
            Inline::Foreign {
                key: "⟦MDX_1⟧".to_string()
            },
            Inline::text(" world"),
        ])]
    );
}

#[test]
fn test_serialize_markdown_should_merge_adjacent_lists() {
    let doc = mdxlate::richtext::Document::new(vec![
        Block::List(List::bullet(vec![ListItem::new(vec![Inline::text("a")])])),
        Block::List(List::bullet(vec![ListItem::new(vec![Inline::text("b")])])),
    ]);
    assert_eq!(serialize_markdown(&doc), "- a\n- b");
}

#[test]
fn test_render_html_should_emit_editor_markup() {
    let mut placeholders = PlaceholderMap::new();
    placeholders.insert("⟦MDX_1⟧", "<Cite id=\"x\"/>");

    let html = render_html(
        &parse_markdown("# T & C\n\n3. x\n4. y\n\nsee ⟦MDX_1⟧\n\n```js\na < b\n```"),
        &placeholders,
    );

    assert!(html.contains("<h1>T &amp; C</h1>"));
    assert!(html.contains("<ol start=\"3\">"));
    assert!(html.contains("<pre><code class=\"language-js\">a &lt; b"));
    assert!(html.contains(
        "<span data-mdx-placeholder=\"⟦MDX_1⟧\" contenteditable=\"false\" class=\"mdx-chip\">Cite</span>"
    ));
}

#[test]
fn test_parse_html_should_accept_synonym_tags() {
    let doc = parse_html("<div>a <b>b</b> <i>c</i> <s>d</s> <font>e</font></div>");
    assert_eq!(serialize_markdown(&doc), "a **b** *c* ~~d~~ e");
}

#[test]
fn test_parse_html_should_read_table_and_lists() {
    let html = "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
                <tbody><tr><td>1</td><td>2</td></tr></tbody></table>\
                <ul><li>x<ul><li>y</li></ul></li></ul>";
    assert_eq!(
        serialize_markdown(&parse_html(html)),
        "| A | B |\n| --- | --- |\n| 1 | 2 |\n\n- x\n  - y"
    );
}

#[test]
fn test_round_trip_with_nested_italic_should_not_turn_bold() {
    assert_eq!(round_trip("_*word*_"), "*word*");
    assert_eq!(
        parse_markdown(&round_trip("_*word*_")).blocks,
        vec![Block::Paragraph(vec![Inline::Italic(vec![Inline::text("word")])])]
    );
}

#[test]
fn test_round_trip_with_empty_first_item_line_should_be_stable() {
    let once = round_trip("- \nfoo");
    assert_eq!(once, "- foo");
    assert_eq!(round_trip(&once), once);
}

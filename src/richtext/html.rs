/*!
 * HTML adapter for the browser editor.
 *
 * `render_html` turns a document into the small HTML subset the editor
 * edits; placeholder keys become non-editable chips. `parse_html` reads
 * that subset back (plus common synonyms such as `<b>` and `<i>`) using
 * html5ever, so whatever the browser's contenteditable produced is
 * normalized through a real HTML parser. Unknown elements are transparent.
 */

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::placeholder::PlaceholderMap;
use crate::richtext::node::{Block, Document, Inline, List, ListItem, Table, normalize_inlines};

/// Attribute carrying the placeholder key on a chip
pub const PLACEHOLDER_ATTRIBUTE: &str = "data-mdx-placeholder";

/// Attribute marking the script element that carries a placeholder map
pub const PLACEHOLDER_SCRIPT_ATTRIBUTE: &str = "data-mdx-placeholders";

/// Attribute carrying a code block's info string after the language
pub const CODE_META_ATTRIBUTE: &str = "data-meta";

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a document as editor HTML
pub fn render_html(document: &Document, placeholders: &PlaceholderMap) -> String {
    let mut out = String::new();
    for block in &document.blocks {
        render_block(block, placeholders, &mut out);
    }
    out
}

fn render_block(block: &Block, placeholders: &PlaceholderMap, out: &mut String) {
    match block {
        Block::Paragraph(content) => {
            out.push_str("<p>");
            render_inlines(content, placeholders, out);
            out.push_str("</p>\n");
        }
        Block::Heading { level, content } => {
            let level = (*level).clamp(1, 6);
            out.push_str(&format!("<h{}>", level));
            render_inlines(content, placeholders, out);
            out.push_str(&format!("</h{}>\n", level));
        }
        Block::BlockQuote(blocks) => {
            out.push_str("<blockquote>\n");
            for inner in blocks {
                render_block(inner, placeholders, out);
            }
            out.push_str("</blockquote>\n");
        }
        Block::List(list) => render_list(list, placeholders, out),
        Block::CodeBlock { language, meta, code } => {
            out.push_str("<pre><code");
            if let Some(language) = language {
                out.push_str(&format!(" class=\"language-{}\"", escape_html(language)));
            }
            if let Some(meta) = meta {
                out.push_str(&format!(" {}=\"{}\"", CODE_META_ATTRIBUTE, escape_html(meta)));
            }
            out.push('>');
            out.push_str(&escape_html(code));
            out.push_str("</code></pre>\n");
        }
        Block::Table(table) => render_table(table, placeholders, out),
        Block::ThematicBreak => out.push_str("<hr>\n"),
    }
}

fn render_list(list: &List, placeholders: &PlaceholderMap, out: &mut String) {
    if !list.ordered {
        out.push_str("<ul>\n");
    } else if list.start == 1 {
        out.push_str("<ol>\n");
    } else {
        out.push_str(&format!("<ol start=\"{}\">\n", list.start));
    }
    for item in &list.items {
        out.push_str("<li>");
        render_inlines(&item.content, placeholders, out);
        if !item.children.is_empty() {
            out.push('\n');
            for child in &item.children {
                render_block(child, placeholders, out);
            }
        }
        out.push_str("</li>\n");
    }
    out.push_str(if list.ordered { "</ol>\n" } else { "</ul>\n" });
}

fn render_table(table: &Table, placeholders: &PlaceholderMap, out: &mut String) {
    let columns = table.columns();
    out.push_str("<table>\n<thead>\n<tr>");
    for cell in &table.header {
        out.push_str("<th>");
        render_inlines(cell, placeholders, out);
        out.push_str("</th>");
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in &table.rows {
        out.push_str("<tr>");
        for c in 0..columns.max(row.len()) {
            out.push_str("<td>");
            if let Some(cell) = row.get(c) {
                render_inlines(cell, placeholders, out);
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

fn render_inlines(inlines: &[Inline], placeholders: &PlaceholderMap, out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Bold(children) => wrap_tag("strong", children, placeholders, out),
            Inline::Italic(children) => wrap_tag("em", children, placeholders, out),
            Inline::Strikethrough(children) => wrap_tag("del", children, placeholders, out),
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(code));
                out.push_str("</code>");
            }
            Inline::Link { href, children } => {
                out.push_str(&format!("<a href=\"{}\">", escape_html(href)));
                render_inlines(children, placeholders, out);
                out.push_str("</a>");
            }
            Inline::Image { alt, src } => {
                out.push_str(&format!("<img src=\"{}\" alt=\"{}\">", escape_html(src), escape_html(alt)));
            }
            Inline::LineBreak => out.push_str("<br>"),
            Inline::Foreign { key } => {
                out.push_str(&format!(
                    "<span {}=\"{}\" contenteditable=\"false\" class=\"mdx-chip\">{}</span>",
                    PLACEHOLDER_ATTRIBUTE,
                    escape_html(key),
                    escape_html(&placeholders.label(key))
                ));
            }
        }
    }
}

fn wrap_tag(tag: &str, children: &[Inline], placeholders: &PlaceholderMap, out: &mut String) {
    out.push_str(&format!("<{}>", tag));
    render_inlines(children, placeholders, out);
    out.push_str(&format!("</{}>", tag));
}

/// Parse editor HTML back into a document
pub fn parse_html(html: &str) -> Document {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    match find_element(&dom.document, "body") {
        Some(body) => Document::new(blocks_from(&children_of(&body))),
        None => Document::default(),
    }
}

/// A `<script type="application/json">` element holding `placeholders`.
///
/// `</` is written as `<\/` so element sources cannot close the script early.
pub fn placeholder_script(placeholders: &PlaceholderMap) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(placeholders)?;
    Ok(format!(
        "<script type=\"application/json\" {}>{}</script>\n",
        PLACEHOLDER_SCRIPT_ATTRIBUTE,
        json.replace("</", "<\\/")
    ))
}

/// The placeholder map embedded by `placeholder_script`, if the page has one
pub fn embedded_placeholders(html: &str) -> Result<Option<PlaceholderMap>, serde_json::Error> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    match find_placeholder_script(&dom.document) {
        Some(script) => serde_json::from_str(&text_content(&script)).map(Some),
        None => Ok(None),
    }
}

fn find_placeholder_script(node: &Handle) -> Option<Handle> {
    if element_name(node).as_deref() == Some("script") && attribute(node, PLACEHOLDER_SCRIPT_ATTRIBUTE).is_some() {
        return Some(node.clone());
    }
    node.children.borrow().iter().find_map(find_placeholder_script)
}

fn children_of(node: &Handle) -> Vec<Handle> {
    node.children.borrow().iter().cloned().collect()
}

fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

fn attribute(node: &Handle, wanted: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.to_string().eq_ignore_ascii_case(wanted))
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

fn find_element(node: &Handle, wanted: &str) -> Option<Handle> {
    if element_name(node).as_deref() == Some(wanted) {
        return Some(node.clone());
    }
    node.children.borrow().iter().find_map(|child| find_element(child, wanted))
}

/// All descendant text, as is
fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

fn is_block_name(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "blockquote"
            | "ul"
            | "ol"
            | "li"
            | "pre"
            | "table"
            | "thead"
            | "tbody"
            | "tr"
            | "hr"
            | "section"
            | "article"
    )
}

/// Whether an element holds block content anywhere below it
fn contains_block(node: &Handle) -> bool {
    node.children.borrow().iter().any(|child| {
        element_name(child).is_some_and(|name| is_block_name(&name)) || contains_block(child)
    })
}

fn blocks_from(nodes: &[Handle]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<Handle> = Vec::new();

    for node in nodes {
        let block_level = match element_name(node) {
            Some(name) => is_block_name(&name) || contains_block(node),
            None => false,
        };
        if block_level {
            flush_paragraph(&mut pending, &mut blocks);
            block_from_element(node, &mut blocks);
        } else {
            pending.push(node.clone());
        }
    }
    flush_paragraph(&mut pending, &mut blocks);
    blocks
}

fn flush_paragraph(pending: &mut Vec<Handle>, blocks: &mut Vec<Block>) {
    let content = trim_inlines(inlines_from(pending));
    pending.clear();
    if !content.is_empty() {
        blocks.push(Block::Paragraph(content));
    }
}

fn block_from_element(node: &Handle, blocks: &mut Vec<Block>) {
    let Some(name) = element_name(node) else {
        return;
    };
    let children = children_of(node);

    match name.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse().unwrap_or(1);
            blocks.push(Block::Heading {
                level,
                content: trim_inlines(inlines_from(&children)),
            });
        }
        "p" if !contains_block(node) => {
            let content = trim_inlines(inlines_from(&children));
            if !content.is_empty() {
                blocks.push(Block::Paragraph(content));
            }
        }
        "blockquote" => {
            let inner = blocks_from(&children);
            if !inner.is_empty() {
                blocks.push(Block::BlockQuote(inner));
            }
        }
        "ul" | "ol" => {
            let start = attribute(node, "start").and_then(|s| s.trim().parse().ok()).unwrap_or(1);
            let items: Vec<ListItem> = children
                .iter()
                .filter(|child| element_name(child).as_deref() == Some("li"))
                .map(list_item_from)
                .collect();
            if !items.is_empty() {
                blocks.push(Block::List(List {
                    ordered: name == "ol",
                    start,
                    items,
                }));
            }
        }
        "pre" => {
            let code_element = find_element(node, "code");
            let language = code_element
                .as_ref()
                .and_then(|code| attribute(code, "class"))
                .or_else(|| attribute(node, "class"))
                .and_then(|class| language_from_class(&class));
            let mut code = text_content(node);
            if code.ends_with('\n') {
                code.pop();
            }
            let meta = code_element
                .as_ref()
                .and_then(|code| attribute(code, CODE_META_ATTRIBUTE))
                .or_else(|| attribute(node, CODE_META_ATTRIBUTE))
                .map(|meta| meta.trim().to_string())
                .filter(|meta| !meta.is_empty());
            blocks.push(Block::CodeBlock { language, meta, code });
        }
        "table" => {
            if let Some(table) = table_from(node) {
                blocks.push(Block::Table(table));
            }
        }
        "hr" => blocks.push(Block::ThematicBreak),
        // div, section, li outside a list and unknown wrappers
        _ => blocks.extend(blocks_from(&children)),
    }
}

/// `language-xxx` (or `lang-xxx`) from a class attribute
fn language_from_class(class: &str) -> Option<String> {
    class
        .split_whitespace()
        .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

/// Item text is every inline run of the item, paragraphs separated by hard
/// breaks; nested lists become children
fn list_item_from(node: &Handle) -> ListItem {
    let mut content: Vec<Inline> = Vec::new();
    let mut children = Vec::new();
    let mut pending: Vec<Handle> = Vec::new();

    let push_run = |run: Vec<Inline>, content: &mut Vec<Inline>| {
        let run = trim_inlines(run);
        if run.is_empty() {
            return;
        }
        if !content.is_empty() {
            content.push(Inline::LineBreak);
        }
        content.extend(run);
    };

    for child in children_of(node) {
        match element_name(&child).as_deref() {
            Some("ul") | Some("ol") => {
                push_run(inlines_from(&pending), &mut content);
                pending.clear();
                block_from_element(&child, &mut children);
            }
            Some(name) if is_block_name(name) => {
                push_run(inlines_from(&pending), &mut content);
                pending.clear();
                for block in blocks_from(&[child.clone()]) {
                    match block {
                        Block::List(_) => children.push(block),
                        Block::Paragraph(inlines) | Block::Heading { content: inlines, .. } => {
                            push_run(inlines, &mut content)
                        }
                        other => children.push(other),
                    }
                }
            }
            _ => pending.push(child.clone()),
        }
    }
    push_run(inlines_from(&pending), &mut content);

    ListItem::new(normalize_inlines(content)).with_children(children)
}

fn table_from(node: &Handle) -> Option<Table> {
    let mut rows: Vec<(bool, Vec<Vec<Inline>>)> = Vec::new();
    collect_rows(node, false, &mut rows);
    if rows.is_empty() {
        return None;
    }

    let header_index = rows.iter().position(|(is_header, _)| *is_header).unwrap_or(0);
    let (_, header) = rows.remove(header_index);
    let columns = header.len();
    let rows = rows
        .into_iter()
        .map(|(_, mut cells)| {
            cells.resize(columns, Vec::new());
            cells
        })
        .collect();
    Some(Table { header, rows })
}

/// Rows in document order; a row is a header row inside `<thead>` or when
/// all of its cells are `<th>`
fn collect_rows(node: &Handle, in_head: bool, rows: &mut Vec<(bool, Vec<Vec<Inline>>)>) {
    for child in children_of(node) {
        match element_name(&child).as_deref() {
            Some("thead") => collect_rows(&child, true, rows),
            Some("tbody") | Some("tfoot") => collect_rows(&child, false, rows),
            Some("tr") => {
                let cells: Vec<Handle> = children_of(&child)
                    .into_iter()
                    .filter(|cell| matches!(element_name(cell).as_deref(), Some("td") | Some("th")))
                    .collect();
                let all_th = !cells.is_empty() && cells.iter().all(|cell| element_name(cell).as_deref() == Some("th"));
                let content = cells
                    .iter()
                    .map(|cell| trim_inlines(inlines_from(&children_of(cell))))
                    .collect();
                rows.push((in_head || all_th, content));
            }
            _ => {}
        }
    }
}

fn inlines_from(nodes: &[Handle]) -> Vec<Inline> {
    let mut out = Vec::new();
    for node in nodes {
        inline_from(node, &mut out);
    }
    normalize_inlines(out)
}

fn inline_from(node: &Handle, out: &mut Vec<Inline>) {
    let name = match &node.data {
        NodeData::Text { contents } => {
            out.push(Inline::Text(collapse_whitespace(&contents.borrow())));
            return;
        }
        NodeData::Element { .. } => element_name(node).unwrap_or_default(),
        _ => return,
    };

    if let Some(key) = attribute(node, PLACEHOLDER_ATTRIBUTE) {
        out.push(Inline::Foreign { key });
        return;
    }

    let children = children_of(node);
    match name.as_str() {
        "strong" | "b" => push_wrapped(Inline::Bold, &children, out),
        "em" | "i" => push_wrapped(Inline::Italic, &children, out),
        "del" | "s" | "strike" => push_wrapped(Inline::Strikethrough, &children, out),
        "code" => out.push(Inline::Code(text_content(node))),
        "a" => {
            let link_children = inlines_from(&children);
            match attribute(node, "href") {
                Some(href) => out.push(Inline::Link {
                    href,
                    children: link_children,
                }),
                None => out.extend(link_children),
            }
        }
        "img" => out.push(Inline::Image {
            alt: attribute(node, "alt").unwrap_or_default(),
            src: attribute(node, "src").unwrap_or_default(),
        }),
        "br" => out.push(Inline::LineBreak),
        "script" | "style" => {}
        _ => {
            for child in &children {
                inline_from(child, out);
            }
        }
    }
}

fn push_wrapped(build: fn(Vec<Inline>) -> Inline, children: &[Handle], out: &mut Vec<Inline>) {
    let inner = inlines_from(children);
    if !inner.is_empty() {
        out.push(build(inner));
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{A0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Trim whitespace at the edges of a block's inline content and around
/// hard breaks
fn trim_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut inlines = normalize_inlines(inlines);
    let count = inlines.len();
    for n in 0..count {
        let after_edge = n == 0 || inlines[n - 1] == Inline::LineBreak;
        let before_edge = n + 1 == count || inlines[n + 1] == Inline::LineBreak;
        if let Inline::Text(text) = &mut inlines[n] {
            if after_edge {
                *text = text.trim_start().to_string();
            }
            if before_edge {
                *text = text.trim_end().to_string();
            }
        }
    }
    normalize_inlines(inlines)
}

/*!
 * Rich-text to Markdown serialization.
 *
 * Each block has one fixed emission rule and blocks are separated by a
 * blank line. Text is escaped so that the output parses back to the same
 * tree: `serialize(parse(serialize(doc))) == serialize(doc)` for trees the
 * parser produces.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::richtext::node::{Block, Document, Inline, List, Table};

/// Ordered-list marker at the start of a line, e.g. `12.` followed by a space
static ORDINAL_START_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,9})([.)])(?:[ \t]|$)").expect("Invalid ordinal regex"));

/// Serialize a document to Markdown
pub fn serialize_markdown(document: &Document) -> String {
    serialize_blocks(&document.blocks)
}

/// Where inline content ends up; decides escaping and line-break handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineContext {
    /// Paragraphs and list items: hard breaks allowed
    Flow,
    /// Headings: single line
    Heading,
    /// Table cells: single line, pipes escaped
    Cell,
}

fn serialize_blocks(blocks: &[Block]) -> String {
    merge_adjacent_lists(blocks)
        .iter()
        .map(serialize_block)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Consecutive lists of the same kind would parse back as one list
fn merge_adjacent_lists(blocks: &[Block]) -> Vec<Block> {
    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if let (Some(Block::List(previous)), Block::List(list)) = (merged.last_mut(), block) {
            if previous.ordered == list.ordered {
                previous.items.extend(list.items.iter().cloned());
                continue;
            }
        }
        merged.push(block.clone());
    }
    merged
}

fn serialize_block(block: &Block) -> String {
    match block {
        Block::Paragraph(content) => escape_line_starts(&serialize_inlines(content, InlineContext::Flow)),
        Block::Heading { level, content } => {
            let marker = "#".repeat((*level).clamp(1, 6) as usize);
            let mut text = serialize_inlines(content, InlineContext::Heading);
            if text.ends_with('#') {
                // A trailing `#` run would read as a closing sequence
                let run = text.chars().rev().take_while(|c| *c == '#').count();
                text.insert(text.len() - run, '\\');
            }
            if text.is_empty() {
                marker
            } else {
                format!("{} {}", marker, text)
            }
        }
        Block::BlockQuote(blocks) => serialize_blocks(blocks)
            .lines()
            .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {}", line) })
            .collect::<Vec<_>>()
            .join("\n"),
        Block::List(list) => serialize_list(list, 0),
        Block::CodeBlock { language, meta, code } => {
            let info = [language.as_deref(), meta.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            // A backtick in the info string would turn a backtick fence into inline code
            let marker = if info.contains('`') { '~' } else { '`' };
            let longest = code
                .lines()
                .map(|line| line.trim_start().chars().take_while(|c| *c == marker).count())
                .max()
                .unwrap_or(0);
            let fence = marker.to_string().repeat(longest.max(2) + 1);
            format!("{}{}\n{}{}{}", fence, info, code, if code.is_empty() { "" } else { "\n" }, fence)
        }
        Block::Table(table) => serialize_table(table),
        Block::ThematicBreak => "---".to_string(),
    }
}

fn serialize_list(list: &List, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let mut lines = Vec::new();

    for (n, item) in list.items.iter().enumerate() {
        let marker = if list.ordered {
            format!("{}.", list.start.saturating_add(n as u64))
        } else {
            "-".to_string()
        };
        let content = escape_line_starts(&serialize_inlines(&item.content, InlineContext::Flow));
        let mut content_lines = content.lines();
        match content_lines.next() {
            Some(first) => lines.push(format!("{}{} {}", indent, marker, first)),
            None => lines.push(format!("{}{}", indent, marker)),
        }
        for continuation in content_lines {
            lines.push(format!("{}  {}", indent, continuation));
        }

        for child in merge_adjacent_lists(&item.children) {
            match child {
                Block::List(sub) => lines.push(serialize_list(&sub, depth + 1)),
                other => {
                    // Non-list children only come from HTML; keep their text
                    // as indented continuation
                    for line in serialize_block(&other).lines() {
                        lines.push(format!("{}  {}", indent, escape_line_start(line)));
                    }
                }
            }
        }
    }

    lines.join("\n")
}

fn serialize_table(table: &Table) -> String {
    let columns = table.columns().max(table.rows.iter().map(Vec::len).max().unwrap_or(0));
    if columns == 0 {
        return String::new();
    }

    let row_line = |cells: &[Vec<Inline>]| {
        let rendered: Vec<String> = (0..columns)
            .map(|c| cells.get(c).map_or_else(String::new, |cell| serialize_inlines(cell, InlineContext::Cell)))
            .collect();
        format!("| {} |", rendered.join(" | "))
    };

    let mut lines = vec![row_line(&table.header)];
    lines.push(format!("|{}", " --- |".repeat(columns)));
    lines.extend(table.rows.iter().map(|row| row_line(row)));
    lines.join("\n")
}

fn serialize_inlines(inlines: &[Inline], context: InlineContext) -> String {
    // Leading and trailing hard breaks do not survive a reparse
    let start = inlines.iter().position(|i| *i != Inline::LineBreak).unwrap_or(inlines.len());
    let end = inlines.iter().rposition(|i| *i != Inline::LineBreak).map_or(start, |p| p + 1);

    let mut out = String::new();
    for inline in &inlines[start..end] {
        serialize_inline(inline, context, &mut out);
    }
    out
}

fn serialize_inline(inline: &Inline, context: InlineContext, out: &mut String) {
    match inline {
        Inline::Text(text) => out.push_str(&escape_text(text, context)),
        Inline::Bold(children) => wrap(&flatten_nested(children, as_bold), "**", context, out),
        Inline::Italic(children) => wrap(&flatten_nested(children, as_italic), "*", context, out),
        Inline::Strikethrough(children) => wrap(&flatten_nested(children, as_strikethrough), "~~", context, out),
        Inline::Code(code) => out.push_str(&code_span(code)),
        Inline::Link { href, children } => {
            if out.ends_with('!') {
                out.insert(out.len() - 1, '\\');
            }
            let label = serialize_inlines(children, single_line(context));
            out.push_str(&format!("[{}]({})", label, destination(href)));
        }
        Inline::Image { alt, src } => {
            let alt = escape_text(&collapse_whitespace(alt), single_line(context));
            out.push_str(&format!("![{}]({})", alt, destination(src)));
        }
        Inline::LineBreak => match context {
            InlineContext::Flow => out.push_str("\\\n"),
            InlineContext::Heading | InlineContext::Cell => out.push(' '),
        },
        Inline::Foreign { key } => out.push_str(key),
    }
}

fn single_line(context: InlineContext) -> InlineContext {
    match context {
        InlineContext::Flow => InlineContext::Heading,
        other => other,
    }
}

fn as_bold(inline: &Inline) -> Option<&[Inline]> {
    match inline {
        Inline::Bold(children) => Some(children),
        _ => None,
    }
}

fn as_italic(inline: &Inline) -> Option<&[Inline]> {
    match inline {
        Inline::Italic(children) => Some(children),
        _ => None,
    }
}

fn as_strikethrough(inline: &Inline) -> Option<&[Inline]> {
    match inline {
        Inline::Strikethrough(children) => Some(children),
        _ => None,
    }
}

/// Unwrap emphasis nested directly in emphasis of the same kind; doubled
/// `*` markers would read back as bold
fn flatten_nested(children: &[Inline], same_kind: fn(&Inline) -> Option<&[Inline]>) -> Vec<Inline> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match same_kind(child) {
            Some(inner) => out.extend(flatten_nested(inner, same_kind)),
            None => out.push(child.clone()),
        }
    }
    out
}

/// Emphasis markers hug the content; surrounding whitespace moves outside
fn wrap(children: &[Inline], marker: &str, context: InlineContext, out: &mut String) {
    let inner = serialize_inlines(children, context);
    let trimmed = inner.trim_matches(' ');
    if trimmed.is_empty() {
        out.push_str(&inner);
        return;
    }
    let leading = &inner[..inner.len() - inner.trim_start_matches(' ').len()];
    let trailing = &inner[inner.trim_end_matches(' ').len()..];
    out.push_str(leading);
    out.push_str(marker);
    out.push_str(trimmed);
    out.push_str(marker);
    out.push_str(trailing);
}

/// Backtick fence one longer than the longest run inside the code
fn code_span(code: &str) -> String {
    let code = code.replace('\n', " ");
    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    let needs_padding = code.starts_with('`')
        || code.ends_with('`')
        || (code.len() >= 2 && code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
    if needs_padding {
        format!("{} {} {}", fence, code, fence)
    } else {
        format!("{}{}{}", fence, code, fence)
    }
}

/// Link destinations with spaces or parentheses go inside `<...>`
fn destination(url: &str) -> String {
    if url.is_empty() || url.contains([' ', '(', ')', '<', '>']) {
        format!("<{}>", url.replace(['<', '>'], ""))
    } else {
        url.to_string()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape characters the inline parser would read as markup
fn escape_text(text: &str, context: InlineContext) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '~' => {
                out.push('\\');
                out.push(c);
            }
            '|' if context == InlineContext::Cell => out.push_str("\\|"),
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Escape block markers at the start of every line of flow content
fn escape_line_starts(text: &str) -> String {
    text.split('\n').map(escape_line_start).collect::<Vec<_>>().join("\n")
}

fn escape_line_start(line: &str) -> String {
    let leading = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(leading);
    if rest.starts_with(['#', '>', '-', '+']) {
        return format!("{}\\{}", indent, rest);
    }
    if let Some(caps) = ORDINAL_START_REGEX.captures(rest) {
        let digits = caps[1].len();
        return format!("{}{}\\{}", indent, &rest[..digits], &rest[digits..]);
    }
    line.to_string()
}

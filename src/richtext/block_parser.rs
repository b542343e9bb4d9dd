/*!
 * Block-level Markdown parser.
 *
 * A line-oriented recursive parser for the dialect the editor supports:
 * headings, paragraphs, block quotes, fenced code, thematic breaks, lists
 * with nested sub-lists and pipe tables. It is deliberately smaller than
 * CommonMark: no setext headings, no indented code, no lazy quote
 * continuation, and list items hold one paragraph plus nested lists.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::richtext::inline_parser::parse_inlines;
use crate::richtext::node::{Block, Document, Inline, List, ListItem, Table};
use crate::segmenter::{fence_opening, is_table_separator, is_thematic_break};

static HEADING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*))?$").expect("Invalid heading regex"));

static LIST_ITEM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^( *)([-*+]|(\d{1,9})[.)])(?:[ \t]+(.*))?$").expect("Invalid list item regex")
});

/// Parse Markdown into a document tree
pub fn parse_markdown(markdown: &str) -> Document {
    let lines: Vec<&str> = markdown.lines().collect();
    Document::new(parse_blocks(&lines))
}

/// A list item line: indent, ordered marker number, text
struct ItemLine<'a> {
    indent: usize,
    number: Option<u64>,
    text: &'a str,
}

fn list_item(line: &str) -> Option<ItemLine<'_>> {
    if is_thematic_break(line.trim_start()) {
        return None;
    }
    let caps = LIST_ITEM_REGEX.captures(line)?;
    Some(ItemLine {
        indent: caps.get(1).map_or(0, |m| m.as_str().len()),
        number: caps.get(3).and_then(|m| m.as_str().parse().ok()),
        text: caps.get(4).map_or("", |m| m.as_str()),
    })
}

/// An opening fence line: indent, fence character, run length, info string
struct FenceLine<'a> {
    indent: usize,
    marker: char,
    len: usize,
    info: &'a str,
}

fn fence_line(line: &str) -> Option<FenceLine<'_>> {
    let trimmed = line.trim_start_matches(' ');
    let indent = line.len() - trimmed.len();
    if indent > 3 {
        return None;
    }
    let (marker, len) = fence_opening(trimmed)?;
    Some(FenceLine {
        indent,
        marker,
        len,
        info: trimmed[len..].trim(),
    })
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_quote(line: &str) -> bool {
    let trimmed = line.trim_start();
    line.len() - trimmed.len() <= 3 && trimmed.starts_with('>')
}

fn is_table_start(lines: &[&str], i: usize) -> bool {
    lines[i].contains('|') && lines.get(i + 1).is_some_and(|next| is_table_separator(next.trim()))
}

/// Whether `lines[i]` starts a block other than a paragraph
fn starts_block(lines: &[&str], i: usize) -> bool {
    let line = lines[i];
    HEADING_REGEX.is_match(line)
        || fence_line(line).is_some()
        || is_quote(line)
        || is_thematic_break(line.trim_start())
        || list_item(line).is_some()
        || is_table_start(lines, i)
}

fn parse_blocks(lines: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if is_blank(line) {
            i += 1;
            continue;
        }

        if let Some(fence) = fence_line(line) {
            let (block, next) = parse_fence(lines, i, &fence);
            blocks.push(block);
            i = next;
        } else if let Some(caps) = HEADING_REGEX.captures(line) {
            let level = caps[1].len() as u8;
            let content = heading_text(caps.get(2).map_or("", |m| m.as_str()));
            blocks.push(Block::Heading {
                level,
                content: parse_inlines(content),
            });
            i += 1;
        } else if is_thematic_break(line.trim_start()) {
            blocks.push(Block::ThematicBreak);
            i += 1;
        } else if is_quote(line) {
            let mut inner = Vec::new();
            while i < lines.len() && is_quote(lines[i]) {
                inner.push(strip_quote_marker(lines[i]));
                i += 1;
            }
            blocks.push(Block::BlockQuote(parse_blocks(&inner)));
        } else if let Some(item) = list_item(line) {
            let (list, next) = parse_list(lines, i, item.indent);
            blocks.push(Block::List(list));
            i = next;
        } else if is_table_start(lines, i) {
            let (table, next) = parse_table(lines, i);
            blocks.push(Block::Table(table));
            i = next;
        } else {
            let start = i;
            i += 1;
            while i < lines.len() && !is_blank(lines[i]) && !starts_block(lines, i) {
                i += 1;
            }
            blocks.push(Block::Paragraph(parse_inlines(&join_lines(&lines[start..i]))));
        }
    }

    blocks
}

/// Heading text without an optional closing `#` sequence
fn heading_text(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without = trimmed.trim_end_matches('#');
    if without.is_empty() {
        ""
    } else if without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        trimmed
    }
}

fn strip_quote_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    let rest = &trimmed[1..];
    rest.strip_prefix(' ').unwrap_or(rest)
}

/// Join paragraph lines: soft breaks become spaces, hard breaks (two
/// trailing spaces or an unescaped trailing backslash) become newlines
fn join_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    for (n, line) in lines.iter().enumerate() {
        let text = line.trim_start();
        if n + 1 == lines.len() {
            out.push_str(text.trim_end());
            break;
        }
        let trailing_backslashes = text.trim_end().chars().rev().take_while(|c| *c == '\\').count();
        if trailing_backslashes % 2 == 1 {
            let content = text.trim_end();
            out.push_str(&content[..content.len() - 1]);
            out.push('\n');
        } else if text.ends_with("  ") {
            out.push_str(text.trim_end());
            out.push('\n');
        } else {
            out.push_str(text.trim_end());
            out.push(' ');
        }
    }
    out
}

/// Fenced code block; the first word of the info string is the language,
/// the rest is kept verbatim as meta
fn parse_fence(lines: &[&str], start: usize, fence: &FenceLine) -> (Block, usize) {
    let (language, meta) = match fence.info.split_once(char::is_whitespace) {
        Some((language, rest)) => (language, rest.trim()),
        None => (fence.info, ""),
    };
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    let mut code_lines = Vec::new();
    let mut i = start + 1;
    while i < lines.len() {
        let trimmed = lines[i].trim();
        let run = trimmed.chars().take_while(|c| *c == fence.marker).count();
        if run >= fence.len && run == trimmed.len() {
            i += 1;
            break;
        }
        let line = lines[i];
        let strip = line.len() - line.trim_start_matches(' ').len();
        code_lines.push(&line[strip.min(fence.indent)..]);
        i += 1;
    }

    (
        Block::CodeBlock {
            language: non_empty(language),
            meta: non_empty(meta),
            code: code_lines.join("\n"),
        },
        i,
    )
}

fn parse_list(lines: &[&str], start: usize, base_indent: usize) -> (List, usize) {
    let first_number = list_item(lines[start]).and_then(|item| item.number);
    let ordered = first_number.is_some();
    let mut items: Vec<ListItem> = Vec::new();
    let mut i = start;

    while i < lines.len() {
        if is_blank(lines[i]) {
            // A blank line ends the list unless another item follows
            let next = (i..lines.len()).find(|&n| !is_blank(lines[n]));
            match next.and_then(|n| list_item(lines[n]).map(|item| (n, item))) {
                Some((n, item)) if item.indent >= base_indent && !items.is_empty() => i = n,
                _ => break,
            }
            continue;
        }

        let Some(item) = list_item(lines[i]) else {
            break;
        };
        if item.indent > base_indent {
            // Sub-list separated from its parent item by a blank line
            let Some(parent) = items.last_mut() else {
                break;
            };
            let (list, next) = parse_list(lines, i, item.indent);
            parent.children.push(Block::List(list));
            i = next;
            continue;
        }
        if item.indent != base_indent || item.number.is_some() != ordered {
            break;
        }

        let mut text_lines = vec![item.text];
        i += 1;
        while i < lines.len() && !is_blank(lines[i]) && !starts_block(lines, i) {
            text_lines.push(lines[i]);
            i += 1;
        }

        let mut children = Vec::new();
        while i < lines.len() {
            match list_item(lines[i]) {
                Some(child) if child.indent > base_indent => {
                    let (list, next) = parse_list(lines, i, child.indent);
                    children.push(Block::List(list));
                    i = next;
                }
                _ => break,
            }
        }

        // An empty marker line leaves a soft break in front of the continuation
        let text = join_lines(&text_lines);
        items.push(ListItem::new(parse_inlines(text.trim_start())).with_children(children));
    }

    let list = match first_number {
        Some(number) => List::numbered(number, items),
        None => List::bullet(items),
    };
    (list, i)
}

/// Split a table row into raw cell texts.
///
/// Escaped pipes and pipes inside code spans do not split.
fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = match inner.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => inner,
    };

    let bytes = inner.as_bytes();
    let mut cells = Vec::new();
    let mut cell_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'`' => {
                let run = bytes[i..].iter().take_while(|b| **b == b'`').count();
                let closing = "`".repeat(run);
                if let Some(rel) = inner[i + run..].find(closing.as_str()) {
                    i += run + rel + run;
                    continue;
                }
                i += run;
                continue;
            }
            b'|' => {
                cells.push(inner[cell_start..i].trim().to_string());
                cell_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    cells.push(inner[cell_start..].trim().to_string());
    cells
}

fn parse_table(lines: &[&str], start: usize) -> (Table, usize) {
    let header: Vec<Vec<Inline>> = split_cells(lines[start]).iter().map(|c| parse_inlines(c)).collect();
    let columns = header.len();

    let mut rows = Vec::new();
    let mut i = start + 2;
    while i < lines.len() && !is_blank(lines[i]) && lines[i].contains('|') {
        let mut cells: Vec<Vec<Inline>> = split_cells(lines[i]).iter().map(|c| parse_inlines(c)).collect();
        // Ragged rows: pad with empty cells, drop extras
        cells.resize(columns, Vec::new());
        rows.push(cells);
        i += 1;
    }

    (Table { header, rows }, i)
}

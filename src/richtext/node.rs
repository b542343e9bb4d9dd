/*!
 * Rich-text document tree.
 *
 * Blocks hold either further blocks (quotes, list children) or inline
 * content (paragraphs, headings, list item text, table cells). The split
 * is carried by the types, so a paragraph can never contain a list.
 */

use serde::{Deserialize, Serialize};

/// A parsed document: an ordered list of blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Top-level blocks in source order
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create a document from blocks
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Whether the document has no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Block-level node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    /// Paragraph of inline content
    Paragraph(Vec<Inline>),
    /// Heading, level 1 to 6
    Heading { level: u8, content: Vec<Inline> },
    /// Block quote; nesting depth is the number of enclosing quotes
    BlockQuote(Vec<Block>),
    /// Ordered or unordered list
    List(List),
    /// Fenced code block; `meta` is the info string after the language,
    /// e.g. `title="app.js" {1,3}`
    CodeBlock {
        language: Option<String>,
        meta: Option<String>,
        code: String,
    },
    /// Pipe table
    Table(Table),
    /// Horizontal rule
    ThematicBreak,
}

/// A list and its items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    /// Numbered (`1.`) rather than bulleted (`-`)
    pub ordered: bool,
    /// Number of the first item of an ordered list
    pub start: u64,
    /// Items in order
    pub items: Vec<ListItem>,
}

impl List {
    /// Bulleted list
    pub fn bullet(items: Vec<ListItem>) -> Self {
        Self {
            ordered: false,
            start: 1,
            items,
        }
    }

    /// Numbered list starting at `start`
    pub fn numbered(start: u64, items: Vec<ListItem>) -> Self {
        Self {
            ordered: true,
            start,
            items,
        }
    }
}

/// One list item: its own text plus nested blocks (usually sub-lists)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Item text
    pub content: Vec<Inline>,
    /// Nested blocks
    pub children: Vec<Block>,
}

impl ListItem {
    /// Item with inline content and no children
    pub fn new(content: Vec<Inline>) -> Self {
        Self {
            content,
            children: Vec::new(),
        }
    }

    /// Add nested blocks
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }
}

/// Table with a header row and body rows; each cell is inline content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Header cells; their count is the column count
    pub header: Vec<Vec<Inline>>,
    /// Body rows
    pub rows: Vec<Vec<Vec<Inline>>>,
}

impl Table {
    /// Number of columns declared by the header
    pub fn columns(&self) -> usize {
        self.header.len()
    }
}

/// Inline node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inline {
    /// Literal text
    Text(String),
    /// `**strong**`
    Bold(Vec<Inline>),
    /// `*emphasis*`
    Italic(Vec<Inline>),
    /// `~~deleted~~`
    Strikethrough(Vec<Inline>),
    /// `` `code` ``
    Code(String),
    /// `[children](href)`
    Link { href: String, children: Vec<Inline> },
    /// `![alt](src)`
    Image { alt: String, src: String },
    /// Hard line break
    LineBreak,
    /// Opaque placeholder chip standing for a custom element
    Foreign { key: String },
}

impl Inline {
    /// Text node
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(text.into())
    }
}

/// Concatenated plain text of inline content, without markup
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    collect_text(inlines, &mut out);
    out
}

fn collect_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Strikethrough(children)
            | Inline::Link { children, .. } => collect_text(children, out),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::LineBreak => out.push('\n'),
            Inline::Foreign { key } => out.push_str(key),
        }
    }
}

/// Merge adjacent text nodes and drop empty ones
pub fn normalize_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match inline {
            Inline::Text(text) if text.is_empty() => {}
            Inline::Text(text) => match out.last_mut() {
                Some(Inline::Text(previous)) => previous.push_str(&text),
                _ => out.push(Inline::Text(text)),
            },
            other => out.push(other),
        }
    }
    out
}

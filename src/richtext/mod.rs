/*!
 * Markdown/MDX to rich-text conversion.
 *
 * This module contains the converter behind the WYSIWYG editor:
 * - `node`: the document tree (blocks and inlines)
 * - `block_parser` and `inline_parser`: Markdown to tree
 * - `serializer`: tree to Markdown
 * - `html`: tree to editor HTML and back
 *
 * Everything here is pure and synchronous; calling it repeatedly on the
 * same input is always safe.
 */

pub mod block_parser;
pub mod html;
pub mod inline_parser;
pub mod node;
pub mod serializer;

// Re-export main types
pub use block_parser::parse_markdown;
pub use html::{embedded_placeholders, escape_html, parse_html, placeholder_script, render_html};
pub use inline_parser::parse_inlines;
pub use node::{Block, Document, Inline, List, ListItem, Table, plain_text};
pub use serializer::serialize_markdown;

/// Parse and re-serialize Markdown once
pub fn round_trip(markdown: &str) -> String {
    serialize_markdown(&parse_markdown(markdown))
}

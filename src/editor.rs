/*!
 * Editor-facing conversion API.
 *
 * The browser editor works on HTML. Loading a document extracts custom
 * elements into placeholder keys and renders the rest; saving parses the
 * edited HTML, serializes it back to Markdown and restores the elements.
 */

use log::debug;

use crate::placeholder::{self, Extraction, PlaceholderMap};
use crate::richtext::{
    embedded_placeholders, parse_html, parse_markdown, placeholder_script, render_html, serialize_markdown,
};

/// Render Markdown (already carrying placeholder keys) as editor HTML
pub fn markdown_to_html(markdown: &str, placeholders: &PlaceholderMap) -> String {
    render_html(&parse_markdown(markdown), placeholders)
}

/// Serialize editor HTML back to Markdown; placeholder chips become keys
pub fn html_to_markdown(html: &str) -> String {
    serialize_markdown(&parse_html(html))
}

/// Replace custom elements with placeholder keys
pub fn extract_mdx_placeholders(markdown: &str) -> Extraction {
    placeholder::extract(markdown)
}

/// Put custom elements back in place of their keys
pub fn restore_mdx_placeholders(markdown: &str, placeholders: &PlaceholderMap) -> String {
    placeholder::restore(markdown, placeholders)
}

/// Load path: extract, then render
pub fn load_for_editing(markdown: &str) -> (String, PlaceholderMap) {
    let extraction = extract_mdx_placeholders(markdown);
    debug!("Extracted {} custom element(s) for editing", extraction.placeholders.len());
    let html = markdown_to_html(&extraction.sanitized, &extraction.placeholders);
    (html, extraction.placeholders)
}

/// Save path: serialize the edited HTML, then restore custom elements
pub fn save_from_editor(html: &str, placeholders: &PlaceholderMap) -> String {
    restore_mdx_placeholders(&html_to_markdown(html), placeholders)
}

/// Standalone editor page: the rendered HTML followed by the placeholder
/// map as a JSON script element, so the page alone is enough to save
pub fn export_for_editing(markdown: &str) -> Result<String, serde_json::Error> {
    let (html, placeholders) = load_for_editing(markdown);
    if placeholders.is_empty() {
        return Ok(html);
    }
    Ok(format!("{}{}", html, placeholder_script(&placeholders)?))
}

/// Save path for a page from `export_for_editing`; without an embedded map
/// the keys stay in the Markdown
pub fn import_from_editor(html: &str) -> Result<String, serde_json::Error> {
    let placeholders = embedded_placeholders(html)?.unwrap_or_default();
    Ok(save_from_editor(html, &placeholders))
}

/// Canonical form of a document: extract, parse, serialize, restore.
///
/// Custom elements come back byte for byte; everything else is
/// normalized the way an editor save would normalize it.
pub fn normalize_markdown(markdown: &str) -> String {
    let extraction = extract_mdx_placeholders(markdown);
    let normalized = serialize_markdown(&parse_markdown(&extraction.sanitized));
    restore_mdx_placeholders(&normalized, &extraction.placeholders)
}

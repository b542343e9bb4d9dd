/*!
 * Token segmentation for MDX-aware machine translation.
 *
 * Splits raw Markdown/MDX into alternating "protect" and "translate" spans.
 * Protected spans must reach the output byte for byte; translate spans are
 * prose eligible for machine translation.
 *
 * Protected constructs:
 * - allowlisted custom elements, in full (`<Cite id="x"/>`, `<Footnote>..</Footnote>`)
 * - fenced code blocks, inline code spans
 * - link and image syntax (`[`, `![`, `](url "title")`); the link text is translated
 * - raw HTML/JSX tag brackets, HTML comments, `{...}` expressions, ESM lines
 * - frontmatter and line-leading block markers (`#`, `>`, list bullets, table pipes)
 *
 * The scan is a single left-to-right pass. Concatenating the segments always
 * reproduces the input exactly.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::SegmentationDegraded;
use crate::tag_scanner::{self, default_custom_tags};

/// Block markers at the start of a line: quote markers, then a heading
/// marker or a list marker with an optional task box
static BLOCK_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:>[ \t]?)*(?:#{1,6}(?:[ \t]+|$)|(?:[-*+]|\d{1,9}[.)])(?:[ \t]+|$)(?:\[[ xX]\][ \t]+)?)?")
        .expect("Invalid block prefix regex")
});

/// Reference-style link definition: `[label]: url "title"`
static LINK_DEFINITION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[[^\]]+\]:[ \t]*\S+").expect("Invalid link definition regex")
});

/// ESM statements MDX evaluates instead of rendering
static ESM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:import\s.*(?:\sfrom\s|["'])|export\s+(?:const|let|var|default|function|\{))"#)
        .expect("Invalid ESM regex")
});

/// A run of text that is either translated or passed through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// The source text of this run
    pub text: String,
    /// Whether this run goes to the translation provider
    pub translate: bool,
}

impl Segment {
    /// A span eligible for translation
    pub fn translate(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translate: true,
        }
    }

    /// A span passed through untouched
    pub fn protect(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translate: false,
        }
    }
}

/// Segments plus the recoverable problems met while producing them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    /// Ordered, coalesced segments
    pub segments: Vec<Segment>,
    /// Unterminated constructs that were protected to the end of input
    pub warnings: Vec<SegmentationDegraded>,
}

/// Concatenate segment texts
pub fn join(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}

/// Concatenate only the translatable segment texts
pub fn translatable_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter(|s| s.translate)
        .map(|s| s.text.as_str())
        .collect()
}

/// Segment `text` with the default custom-tag allowlist
pub fn segment(text: &str) -> Vec<Segment> {
    Segmenter::default().segment(text)
}

/// Appends spans, merging neighbours with the same flag
#[derive(Default)]
struct SegmentBuilder {
    segments: Vec<Segment>,
}

impl SegmentBuilder {
    fn push(&mut self, text: &str, translate: bool) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(last) if last.translate == translate => last.text.push_str(text),
            _ => self.segments.push(Segment {
                text: text.to_string(),
                translate,
            }),
        }
    }
}

/// Segmenter configured with the custom elements to protect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmenter {
    custom_tags: Vec<String>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(default_custom_tags())
    }
}

impl Segmenter {
    /// Create a segmenter protecting the given custom element names
    pub fn new(custom_tags: Vec<String>) -> Self {
        Self { custom_tags }
    }

    /// The custom element allowlist
    pub fn custom_tags(&self) -> &[String] {
        &self.custom_tags
    }

    /// Split `text` into coalesced segments
    pub fn segment(&self, text: &str) -> Vec<Segment> {
        self.segment_with_warnings(text).segments
    }

    /// Split `text`, also reporting unterminated constructs
    pub fn segment_with_warnings(&self, text: &str) -> Segmentation {
        let bytes = text.as_bytes();
        let mut out = SegmentBuilder::default();
        let mut warnings = Vec::new();

        // Offsets of `](url)` tails still ahead of the cursor: (start, end)
        let mut link_tails: Vec<(usize, usize)> = Vec::new();
        let mut plain_start = 0;
        let mut line_checked: Option<usize> = None;
        let mut table_line = false;
        let mut i = 0;

        while i < bytes.len() {
            let mut protected: Option<usize> = None;

            while link_tails.last().is_some_and(|&(start, _)| start < i) {
                link_tails.pop();
            }

            if (i == 0 || bytes[i - 1] == b'\n') && line_checked != Some(i) {
                line_checked = Some(i);
                protected = scan_line_start(text, i, &mut table_line).filter(|&end| end > i);
            }

            if protected.is_none() {
                protected = match bytes[i] {
                    b']' if link_tails.last().is_some_and(|&(start, _)| start == i) => {
                        link_tails.pop().map(|(_, end)| end)
                    }
                    b'`' => scan_code_span(text, i),
                    b'<' => self.scan_angle(text, i, &mut warnings),
                    b'{' => {
                        let scan = tag_scanner::scan_expression(text, i);
                        if !scan.terminated {
                            warnings.push(degraded(i, "{ expression"));
                        }
                        Some(scan.end)
                    }
                    b'!' if bytes.get(i + 1) == Some(&b'[') => find_link_tail(text, i + 1).map(|tail| {
                        link_tails.push(tail);
                        i + 2
                    }),
                    b'[' => find_link_tail(text, i).map(|tail| {
                        link_tails.push(tail);
                        i + 1
                    }),
                    b'|' if table_line => Some(i + 1),
                    b'h' if starts_bare_url(text, i) => Some(bare_url_end(text, i)),
                    _ => None,
                };
            }

            match protected {
                Some(end) if end > i => {
                    out.push(&text[plain_start..i], true);
                    out.push(&text[i..end], false);
                    i = end;
                    plain_start = end;
                }
                _ => {
                    // Escapes keep the escaped character as prose; an
                    // unmatched backtick run is literal as a whole
                    i += match bytes[i] {
                        b'\\' if i + 1 < bytes.len() => 2,
                        b'`' => bytes[i..].iter().take_while(|b| **b == b'`').count(),
                        _ => 1,
                    };
                }
            }
        }
        out.push(&text[plain_start.min(text.len())..], true);

        Segmentation {
            segments: out.segments,
            warnings,
        }
    }

    /// Handle `<` as a custom element, a tag bracket, an autolink or prose
    fn scan_angle(&self, text: &str, i: usize, warnings: &mut Vec<SegmentationDegraded>) -> Option<usize> {
        if let Some(scan) = tag_scanner::scan_custom_tag(text, i, &self.custom_tags) {
            if !scan.terminated {
                let name = tag_scanner::custom_tag_name(text, i, &self.custom_tags).unwrap_or("tag");
                warnings.push(degraded(i, &format!("<{}", name)));
            }
            return Some(scan.end);
        }
        if starts_bare_url(text, i + 1) {
            let end = text[i..].find('>').map(|p| i + p + 1)?;
            return (!text[i..end].contains(char::is_whitespace)).then_some(end);
        }
        tag_scanner::scan_tag_bracket(text, i)
    }
}

fn degraded(offset: usize, construct: &str) -> SegmentationDegraded {
    let warning = SegmentationDegraded {
        offset,
        construct: construct.to_string(),
    };
    warn!("Segmentation degraded: {}", warning);
    warning
}

/// End of the line containing `start`, excluding the newline
fn line_end(text: &str, start: usize) -> usize {
    text[start..].find('\n').map_or(text.len(), |p| start + p)
}

/// Whole-line constructs and block prefixes at a line start
fn scan_line_start(text: &str, start: usize, table_line: &mut bool) -> Option<usize> {
    let end = line_end(text, start);
    let line = &text[start..end];
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    *table_line = trimmed.starts_with('|');

    if start == 0 && line.trim_end() == "---" {
        return Some(frontmatter_end(text).unwrap_or(end));
    }
    if let Some(fence_end) = scan_fence(text, end, trimmed) {
        return Some(fence_end);
    }
    if indent == 0 && ESM_REGEX.is_match(line) {
        return Some(end);
    }
    if is_thematic_break(trimmed) || is_table_separator(trimmed) || LINK_DEFINITION_REGEX.is_match(trimmed) {
        return Some(end);
    }

    let prefix = BLOCK_PREFIX_REGEX.find(trimmed).map_or(0, |m| m.end());
    (indent + prefix > 0).then_some(start + indent + prefix)
}

/// End of a YAML frontmatter block opened by `---` on the first line
fn frontmatter_end(text: &str) -> Option<usize> {
    let mut offset = line_end(text, 0) + 1;
    while offset < text.len() {
        let end = line_end(text, offset);
        if text[offset..end].trim_end() == "---" {
            return Some(end);
        }
        offset = end + 1;
    }
    None
}

/// Fence character and run length when `trimmed` opens a code fence.
///
/// A backtick run followed by an info string that itself contains a
/// backtick is inline code, not a fence.
pub(crate) fn fence_opening(trimmed: &str) -> Option<(char, usize)> {
    let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = trimmed.chars().take_while(|c| *c == fence_char).count();
    if run < 3 || (fence_char == '`' && trimmed[run..].contains('`')) {
        return None;
    }
    Some((fence_char, run))
}

/// If `trimmed` opens a code fence, the end of its closing line
/// (or of the input when the fence never closes)
fn scan_fence(text: &str, opening_end: usize, trimmed: &str) -> Option<usize> {
    let (fence_char, run) = fence_opening(trimmed)?;

    let mut offset = opening_end + 1;
    while offset < text.len() {
        let end = line_end(text, offset);
        let candidate = text[offset..end].trim();
        if candidate.len() >= run && candidate.chars().all(|c| c == fence_char) {
            return Some(end);
        }
        offset = end + 1;
    }
    Some(text.len())
}

/// `---`, `***`, `___`, optionally spaced
pub(crate) fn is_thematic_break(trimmed: &str) -> bool {
    let Some(marker) = trimmed.chars().next().filter(|c| matches!(c, '-' | '*' | '_')) else {
        return false;
    };
    let mut count = 0;
    for c in trimmed.trim_end().chars() {
        if c == marker {
            count += 1;
        } else if c != ' ' && c != '\t' {
            return false;
        }
    }
    count >= 3
}

/// Pipe-table alignment row such as `|---|:--:|`
pub(crate) fn is_table_separator(trimmed: &str) -> bool {
    let row = trimmed.trim_end();
    row.contains('|')
        && row.contains('-')
        && row.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// Inline code span starting with a backtick run at `start`
fn scan_code_span(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let run = bytes[start..].iter().take_while(|b| **b == b'`').count();
    let limit = text[start..].find("\n\n").map_or(text.len(), |p| start + p);

    let mut i = start + run;
    while i < limit {
        if bytes[i] == b'`' {
            let close = bytes[i..limit].iter().take_while(|b| **b == b'`').count();
            if close == run {
                return Some(i + close);
            }
            i += close;
        } else {
            i += 1;
        }
    }
    None
}

/// For `[` at `open`, find the matching `]` followed by `(...)`.
/// Returns `(offset of ']', end of ')')`.
fn find_link_tail(text: &str, open: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let limit = text[open..].find("\n\n").map_or(text.len(), |p| open + p);

    let mut depth = 0usize;
    let mut i = open;
    let close = loop {
        if i >= limit {
            return None;
        }
        match bytes[i] {
            b'\\' => i += 1,
            b'`' => i = scan_code_span(text, i).unwrap_or(i + 1) - 1,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    break i;
                }
            }
            _ => {}
        }
        i += 1;
    };

    if bytes.get(close + 1) != Some(&b'(') {
        return None;
    }
    let mut parens = 0usize;
    let mut j = close + 1;
    while j < limit {
        match bytes[j] {
            b'\\' => j += 1,
            b'(' => parens += 1,
            b')' => {
                parens -= 1;
                if parens == 0 {
                    return Some((close, j + 1));
                }
            }
            b'\n' => return None,
            _ => {}
        }
        j += 1;
    }
    None
}

fn starts_bare_url(text: &str, i: usize) -> bool {
    let rest = &text[i.min(text.len())..];
    let at_boundary = i == 0 || !text.as_bytes()[i - 1].is_ascii_alphanumeric();
    at_boundary && (rest.starts_with("https://") || rest.starts_with("http://"))
}

/// A bare URL runs to whitespace; trailing sentence punctuation stays prose
fn bare_url_end(text: &str, start: usize) -> usize {
    let rest = &text[start..];
    let raw = rest
        .find(|c: char| c.is_whitespace() || c == '<' || c == '"')
        .unwrap_or(rest.len());
    let trimmed = rest[..raw].trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'']);
    start + trimmed.len()
}

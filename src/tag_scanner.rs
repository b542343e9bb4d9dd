/*!
 * Balanced scanning of MDX/JSX constructs.
 *
 * Custom inline elements (`<Cite id="x"/>`, `<Footnote>...</Footnote>`) are
 * found with a small state machine instead of a regular expression:
 *
 * 1. tag name: the name after `<` must be on the allowlist and end at a
 *    whitespace, `/` or `>` boundary
 * 2. attributes: quoted values and `{...}` expressions may contain `>`
 * 3. self-close (`/>`) or children
 * 4. children: same-name opens and closes are depth counted until the
 *    matching `</Name>`
 *
 * All delimiters are ASCII, so scanning works on bytes without ever
 * splitting a multi-byte character.
 */

/// Result of scanning a construct starting at a given offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    /// Byte offset one past the end of the construct
    pub end: usize,
    /// False when the input ended before the construct was closed;
    /// `end` is then the input length
    pub terminated: bool,
}

impl Scan {
    fn closed(end: usize) -> Self {
        Self { end, terminated: true }
    }

    fn open_ended(len: usize) -> Self {
        Self {
            end: len,
            terminated: false,
        }
    }
}

/// Default custom inline elements protected from translation
pub const DEFAULT_CUSTOM_TAGS: &[&str] = &["Cite", "Footnote"];

/// The default allowlist as owned strings
pub fn default_custom_tags() -> Vec<String> {
    DEFAULT_CUSTOM_TAGS.iter().map(|t| t.to_string()).collect()
}

/// Whether `name` is a syntactically valid JSX element name
pub fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-'
}

/// Read the element name starting at `start` (just after `<` or `</`).
fn read_name(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    i
}

/// Whether the byte at `i` ends a tag name: whitespace, `/`, `>` or end
fn is_name_boundary(bytes: &[u8], i: usize) -> bool {
    i >= bytes.len() || bytes[i].is_ascii_whitespace() || bytes[i] == b'/' || bytes[i] == b'>'
}

/// If `text[start..]` opens an allowlisted custom tag, return its name
pub fn custom_tag_name<'a>(text: &'a str, start: usize, allowlist: &[String]) -> Option<&'a str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'<') {
        return None;
    }
    let name_end = read_name(bytes, start + 1);
    if name_end == start + 1 || !is_name_boundary(bytes, name_end) {
        return None;
    }
    let name = &text[start + 1..name_end];
    allowlist.iter().any(|allowed| allowed == name).then_some(name)
}

/// Skip a quoted string whose opening quote is at `start`
fn skip_quoted(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' && quote == b'`' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// Scan a `{...}` MDX expression whose `{` is at `start`.
///
/// Nested braces are counted; string literals and `/* */` comments are
/// skipped so an apostrophe in a comment does not derail the scan.
pub fn scan_expression(text: &str, start: usize) -> Scan {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Scan::closed(i + 1);
                }
            }
            b'"' | b'\'' | b'`' => match skip_quoted(bytes, i) {
                Some(next) => {
                    i = next;
                    continue;
                }
                None => return Scan::open_ended(bytes.len()),
            },
            b'/' if bytes.get(i + 1) == Some(&b'*') => match text[i + 2..].find("*/") {
                Some(rel) => {
                    i = i + 2 + rel + 2;
                    continue;
                }
                None => return Scan::open_ended(bytes.len()),
            },
            _ => {}
        }
        i += 1;
    }
    Scan::open_ended(bytes.len())
}

/// Outcome of scanning the attribute section of an opening tag
enum OpenTag {
    /// `<Name ... />`, ends at the given offset
    SelfClosing(usize),
    /// `<Name ...>`, children start at the given offset
    Open(usize),
    /// Input ended inside the tag
    Unterminated,
}

/// Scan attributes from `i` (just after the name) to the closing `>`
fn scan_open_tag(text: &str, mut i: usize) -> OpenTag {
    let bytes = text.as_bytes();
    let mut last_significant = b'<';
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => match skip_quoted(bytes, i) {
                Some(next) => {
                    last_significant = b'"';
                    i = next;
                    continue;
                }
                None => return OpenTag::Unterminated,
            },
            b'{' => {
                let scan = scan_expression(text, i);
                if !scan.terminated {
                    return OpenTag::Unterminated;
                }
                last_significant = b'}';
                i = scan.end;
                continue;
            }
            b'>' => {
                return if last_significant == b'/' {
                    OpenTag::SelfClosing(i + 1)
                } else {
                    OpenTag::Open(i + 1)
                };
            }
            b if b.is_ascii_whitespace() => {}
            b => last_significant = b,
        }
        i += 1;
    }
    OpenTag::Unterminated
}

/// If `text[i..]` is `</name` followed by optional whitespace and `>`,
/// return the offset after `>`
fn match_close_tag(text: &str, i: usize, name: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let rest = &text[i..];
    if !rest.starts_with("</") || !rest[2..].starts_with(name) {
        return None;
    }
    let mut j = i + 2 + name.len();
    if j < bytes.len() && is_name_byte(bytes[j]) {
        return None;
    }
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    (bytes.get(j) == Some(&b'>')).then_some(j + 1)
}

/// Scan a complete custom element opening at `start`.
///
/// Returns `None` when `text[start..]` does not open an allowlisted tag.
/// An element that never closes yields a scan with `terminated == false`
/// covering the rest of the input.
pub fn scan_custom_tag(text: &str, start: usize, allowlist: &[String]) -> Option<Scan> {
    let name = custom_tag_name(text, start, allowlist)?;
    let bytes = text.as_bytes();

    let children_start = match scan_open_tag(text, start + 1 + name.len()) {
        OpenTag::SelfClosing(end) => return Some(Scan::closed(end)),
        OpenTag::Open(next) => next,
        OpenTag::Unterminated => return Some(Scan::open_ended(bytes.len())),
    };

    let mut depth = 1usize;
    let mut i = children_start;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(end) = match_close_tag(text, i, name) {
                depth -= 1;
                if depth == 0 {
                    return Some(Scan::closed(end));
                }
                i = end;
                continue;
            }
            let nested_end = read_name(bytes, i + 1);
            if &text[i + 1..nested_end] == name && is_name_boundary(bytes, nested_end) {
                match scan_open_tag(text, nested_end) {
                    OpenTag::SelfClosing(end) => {
                        i = end;
                        continue;
                    }
                    OpenTag::Open(next) => {
                        depth += 1;
                        i = next;
                        continue;
                    }
                    OpenTag::Unterminated => return Some(Scan::open_ended(bytes.len())),
                }
            }
        }
        i += 1;
    }
    Some(Scan::open_ended(bytes.len()))
}

/// Scan a raw HTML/JSX tag bracket (`<div class="x">`, `</div>`, `<br/>`)
/// or an HTML comment at `start`.
///
/// Only the bracket itself is covered, not the element's children. Returns
/// `None` when the `<` does not start a tag, e.g. in `a < b`, or when the
/// bracket is never closed.
pub fn scan_tag_bracket(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let rest = &text[start..];
    if let Some(body) = rest.strip_prefix("<!--") {
        return body.find("-->").map(|rel| start + 4 + rel + 3);
    }
    let name_start = if rest.starts_with("</") { start + 2 } else { start + 1 };
    match bytes.get(name_start) {
        Some(b) if b.is_ascii_alphabetic() => {}
        // JSX fragments
        Some(b'>') => return Some(name_start + 1),
        _ => return None,
    }
    let name_end = read_name(bytes, name_start);
    if !is_name_boundary(bytes, name_end) {
        return None;
    }
    match scan_open_tag(text, name_end) {
        OpenTag::SelfClosing(end) | OpenTag::Open(end) => Some(end),
        OpenTag::Unterminated => None,
    }
}

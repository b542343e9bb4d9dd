/*!
 * Inline Markdown parser.
 *
 * Constructs are tried at each position in a fixed order: placeholder
 * keys, images, links, code spans, bold, italic, strikethrough. Anything
 * else is literal text. Backslash before ASCII punctuation yields the
 * punctuation itself; backslash before a newline and a bare newline both
 * yield a hard break (soft breaks are folded into spaces by the block
 * parser before inline parsing).
 */

use crate::placeholder::PLACEHOLDER_REGEX;
use crate::richtext::node::{Inline, normalize_inlines, plain_text};

/// Parse inline Markdown into nodes
pub fn parse_inlines(text: &str) -> Vec<Inline> {
    InlineParser { text }.parse(0, text.len())
}

struct InlineParser<'a> {
    text: &'a str,
}

/// Byte offsets of a `[label](destination)` construct
struct LinkParts {
    /// Offset of the closing `]`
    close: usize,
    /// Destination, unwrapped from `<...>` and without a title
    destination: String,
    /// Offset after the closing `)`
    end: usize,
}

impl<'a> InlineParser<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn parse(&self, start: usize, end: usize) -> Vec<Inline> {
        let bytes = self.bytes();
        let mut out = Vec::new();
        let mut literal = String::new();
        let mut i = start;

        while i < end {
            match bytes[i] {
                b'\\' if i + 1 < end && bytes[i + 1] == b'\n' => {
                    flush(&mut literal, &mut out);
                    out.push(Inline::LineBreak);
                    i += 2;
                    continue;
                }
                b'\\' if i + 1 < end && bytes[i + 1].is_ascii_punctuation() => {
                    literal.push(bytes[i + 1] as char);
                    i += 2;
                    continue;
                }
                b'\n' => {
                    flush(&mut literal, &mut out);
                    out.push(Inline::LineBreak);
                    i += 1;
                    continue;
                }
                _ => {}
            }

            if let Some((node, next)) = self.construct_at(i, end) {
                flush(&mut literal, &mut out);
                out.push(node);
                i = next;
                continue;
            }

            // An unmatched backtick run stays literal as a whole
            if bytes[i] == b'`' {
                let run = run_length(bytes, i, end, b'`');
                literal.push_str(&self.text[i..i + run]);
                i += run;
                continue;
            }

            let Some(c) = self.text[i..end].chars().next() else {
                break;
            };
            literal.push(c);
            i += c.len_utf8();
        }

        flush(&mut literal, &mut out);
        normalize_inlines(out)
    }

    fn construct_at(&self, i: usize, end: usize) -> Option<(Inline, usize)> {
        let bytes = self.bytes();
        match bytes[i] {
            _ if self.text[i..end].starts_with(crate::placeholder::KEY_OPEN) => {
                let found = PLACEHOLDER_REGEX.find(&self.text[i..end]).filter(|m| m.start() == 0)?;
                Some((
                    Inline::Foreign {
                        key: found.as_str().to_string(),
                    },
                    i + found.end(),
                ))
            }
            b'!' if i + 1 < end && bytes[i + 1] == b'[' => {
                let parts = self.link_parts(i + 1, end)?;
                let alt = plain_text(&self.parse(i + 2, parts.close));
                Some((
                    Inline::Image {
                        alt,
                        src: parts.destination,
                    },
                    parts.end,
                ))
            }
            b'[' => {
                let parts = self.link_parts(i, end)?;
                Some((
                    Inline::Link {
                        href: parts.destination,
                        children: self.parse(i + 1, parts.close),
                    },
                    parts.end,
                ))
            }
            b'`' => {
                let (content, next) = self.code_span(i, end)?;
                Some((Inline::Code(content), next))
            }
            b'*' | b'_' => self.emphasis(i, end),
            b'~' if i + 1 < end && bytes[i + 1] == b'~' => {
                if !self.opens_at(i + 2, end) {
                    return None;
                }
                let close = self.find_strike_closer(i + 2, end)?;
                Some((Inline::Strikethrough(self.parse(i + 2, close)), close + 2))
            }
            _ => None,
        }
    }

    /// Whether a delimiter ending just before `after` can open: followed by
    /// a non-whitespace character
    fn opens_at(&self, after: usize, end: usize) -> bool {
        self.text[after..end]
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace())
    }

    fn prev_char(&self, at: usize) -> Option<char> {
        self.text[..at].chars().next_back()
    }

    fn emphasis(&self, i: usize, end: usize) -> Option<(Inline, usize)> {
        let bytes = self.bytes();
        let marker = bytes[i];
        if marker == b'_' && self.prev_char(i).is_some_and(char::is_alphanumeric) {
            return None;
        }

        let run = run_length(bytes, i, end, marker);
        if run >= 2 {
            if !self.opens_at(i + 2, end) {
                return None;
            }
            let close = self.find_emphasis_closer(marker, i + 2, end, true)?;
            return Some((Inline::Bold(self.parse(i + 2, close)), close + 2));
        }

        if !self.opens_at(i + 1, end) {
            return None;
        }
        let close = self.find_emphasis_closer(marker, i + 1, end, false)?;
        Some((Inline::Italic(self.parse(i + 1, close)), close + 1))
    }

    /// Find the closing delimiter for emphasis opened before `from`.
    ///
    /// A bold closer takes the last two markers of a run of two or more. An
    /// italic closer is a lone marker or the last marker of a run of three
    /// (closing a nested bold first); runs of exactly two belong to a nested
    /// bold and are skipped.
    fn find_emphasis_closer(&self, marker: u8, from: usize, end: usize, double: bool) -> Option<usize> {
        let bytes = self.bytes();
        let mut j = from;
        while j < end {
            match bytes[j] {
                b'\\' => {
                    j += 2;
                    continue;
                }
                b'`' => {
                    j = match self.code_span(j, end) {
                        Some((_, next)) => next,
                        None => j + run_length(bytes, j, end, b'`'),
                    };
                    continue;
                }
                b'[' => {
                    if let Some(parts) = self.link_parts(j, end) {
                        j = parts.end;
                        continue;
                    }
                }
                b if b == marker => {
                    let run = run_length(bytes, j, end, marker);
                    let close = match (double, run) {
                        (true, n) if n >= 2 => Some(j + n - 2),
                        (false, 1) => Some(j),
                        (false, 3) => Some(j + 2),
                        _ => None,
                    };
                    let flanking = close.filter(|&c| {
                        c > from
                            && self.prev_char(c).is_some_and(|p| !p.is_whitespace())
                            && (marker != b'_'
                                || !self.text[j + run..end].chars().next().is_some_and(char::is_alphanumeric))
                    });
                    if flanking.is_some() {
                        return flanking;
                    }
                    j += run;
                    continue;
                }
                _ => {}
            }
            j += 1;
        }
        None
    }

    fn find_strike_closer(&self, from: usize, end: usize) -> Option<usize> {
        let bytes = self.bytes();
        let mut j = from;
        while j + 1 < end {
            match bytes[j] {
                b'\\' => {
                    j += 2;
                    continue;
                }
                b'`' => {
                    if let Some((_, next)) = self.code_span(j, end) {
                        j = next;
                        continue;
                    }
                }
                b'~' if bytes[j + 1] == b'~' && j > from => {
                    if self.prev_char(j).is_some_and(|p| !p.is_whitespace()) {
                        return Some(j);
                    }
                }
                _ => {}
            }
            j += 1;
        }
        None
    }

    /// Code span opening with a backtick run at `i`: content and end offset
    fn code_span(&self, i: usize, end: usize) -> Option<(String, usize)> {
        let bytes = self.bytes();
        let run = run_length(bytes, i, end, b'`');
        let mut j = i + run;
        while j < end {
            if bytes[j] == b'`' {
                let closing = run_length(bytes, j, end, b'`');
                if closing == run {
                    let raw = self.text[i + run..j].replace('\n', " ");
                    let content = if raw.len() >= 2
                        && raw.starts_with(' ')
                        && raw.ends_with(' ')
                        && !raw.trim().is_empty()
                    {
                        raw[1..raw.len() - 1].to_string()
                    } else {
                        raw
                    };
                    return Some((content, j + run));
                }
                j += closing;
            } else {
                j += 1;
            }
        }
        None
    }

    /// Match `[label](destination)` with the `[` at `open`
    fn link_parts(&self, open: usize, end: usize) -> Option<LinkParts> {
        let bytes = self.bytes();
        let mut depth = 0usize;
        let mut j = open;
        let close = loop {
            if j >= end {
                return None;
            }
            match bytes[j] {
                b'\\' => j += 1,
                b'`' => {
                    if let Some((_, next)) = self.code_span(j, end) {
                        j = next;
                        continue;
                    }
                }
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        break j;
                    }
                }
                _ => {}
            }
            j += 1;
        };

        if bytes.get(close + 1) != Some(&b'(') {
            return None;
        }
        let dest_start = close + 2;
        let mut parens = 1usize;
        let mut k = dest_start;
        let mut in_angle = bytes.get(k) == Some(&b'<');
        while k < end {
            match bytes[k] {
                b'\\' => k += 1,
                b'>' if in_angle => in_angle = false,
                b'(' if !in_angle => parens += 1,
                b')' if !in_angle => {
                    parens -= 1;
                    if parens == 0 {
                        return Some(LinkParts {
                            close,
                            destination: destination(&self.text[dest_start..k]),
                            end: k + 1,
                        });
                    }
                }
                _ => {}
            }
            k += 1;
        }
        None
    }
}

/// Destination without a title; `<...>` wrapping removed
fn destination(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('<') {
        if let Some(close) = inner.find('>') {
            return inner[..close].to_string();
        }
    }
    raw.split_whitespace().next().unwrap_or_default().to_string()
}

fn run_length(bytes: &[u8], start: usize, end: usize, marker: u8) -> usize {
    bytes[start..end].iter().take_while(|b| **b == marker).count()
}

fn flush(literal: &mut String, out: &mut Vec<Inline>) {
    if !literal.is_empty() {
        out.push(Inline::Text(std::mem::take(literal)));
    }
}

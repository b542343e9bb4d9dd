/*!
 * Placeholder codec for custom MDX elements.
 *
 * Before a document goes through the rich-text editor, every allowlisted
 * custom element (`<Cite id="x"/>`, `<Footnote>...</Footnote>`) is swapped
 * for an opaque key such as `⟦MDX_1⟧`. The editor treats keys as atomic
 * chips; on save the keys are swapped back for the original source.
 *
 * Keys use the mathematical white square brackets U+27E6/U+27E7, which do
 * not occur in Markdown syntax and are rare in prose.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::tag_scanner::{self, default_custom_tags};

/// Opening bracket of a placeholder key
pub const KEY_OPEN: char = '⟦';
/// Closing bracket of a placeholder key
pub const KEY_CLOSE: char = '⟧';

/// Any placeholder-looking token, known to a map or not
pub(crate) static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"⟦MDX_(\d+)⟧").expect("Invalid placeholder regex"));

/// Build the key for counter value `n`
pub fn placeholder_key(n: u64) -> String {
    format!("{}MDX_{}{}", KEY_OPEN, n, KEY_CLOSE)
}

/// Whether `text` is exactly one placeholder key
pub fn is_placeholder_key(text: &str) -> bool {
    PLACEHOLDER_REGEX
        .find(text)
        .is_some_and(|m| m.start() == 0 && m.end() == text.len())
}

/// Key to original source substring, for one extract/restore cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderMap {
    entries: BTreeMap<String, String>,
}

impl PlaceholderMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Original substring for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Record `original` under `key`
    pub fn insert(&mut self, key: impl Into<String>, original: impl Into<String>) {
        self.entries.insert(key.into(), original.into());
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key was extracted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, original)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Short label shown on an editor chip: the element name, or the key
    /// itself when the key is unknown
    pub fn label(&self, key: &str) -> String {
        match self.get(key) {
            Some(original) => {
                let name: String = original
                    .trim_start_matches('<')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
                    .collect();
                if name.is_empty() { key.to_string() } else { name }
            }
            None => key.to_string(),
        }
    }
}

/// Result of `extract`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Input with every custom element replaced by its key
    pub sanitized: String,
    /// Keys issued for this input
    pub placeholders: PlaceholderMap,
}

/// Replace allowlisted custom elements (default `Cite`, `Footnote`) with keys
pub fn extract(text: &str) -> Extraction {
    extract_with(text, &default_custom_tags())
}

/// Replace custom elements named in `allowlist` with keys.
///
/// Numbering starts above the highest key-looking token already in `text`
/// and never issues a key that occurs literally in `text`.
/// Identical elements share one key. Unterminated elements are left in place.
pub fn extract_with(text: &str, allowlist: &[String]) -> Extraction {
    let mut next = PLACEHOLDER_REGEX
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .max()
        .map_or(1, |max| max.wrapping_add(1));

    let mut placeholders = PlaceholderMap::new();
    let mut issued: HashMap<&str, String> = HashMap::new();
    let mut sanitized = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(scan) = tag_scanner::scan_custom_tag(text, i, allowlist).filter(|s| s.terminated) {
                let original = &text[i..scan.end];
                let key = issued.entry(original).or_insert_with(|| {
                    let mut key = placeholder_key(next);
                    while text.contains(key.as_str()) {
                        next = next.wrapping_add(1);
                        key = placeholder_key(next);
                    }
                    next = next.wrapping_add(1);
                    placeholders.insert(key.clone(), original);
                    key
                });
                sanitized.push_str(&text[copied..i]);
                sanitized.push_str(key);
                i = scan.end;
                copied = i;
                continue;
            }
        }
        i += 1;
    }
    sanitized.push_str(&text[copied..]);

    Extraction { sanitized, placeholders }
}

/// Put the original source back for every key known to `placeholders`.
///
/// Unknown keys are echoed verbatim. Replacement is a single pass, so a
/// restored element that itself contains a key-looking token is not
/// expanded again.
pub fn restore(text: &str, placeholders: &PlaceholderMap) -> String {
    if placeholders.is_empty() {
        return text.to_string();
    }
    PLACEHOLDER_REGEX
        .replace_all(text, |caps: &Captures| {
            placeholders.get(&caps[0]).unwrap_or(&caps[0]).to_string()
        })
        .into_owned()
}

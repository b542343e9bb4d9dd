/*!
 * Arabic-script coverage heuristic.
 *
 * Decides whether a string counts as Arabic content by the share of its
 * codepoints that fall in the Arabic Unicode blocks. This is a heuristic,
 * not a proof of correct Arabic: very short strings such as a single
 * Arabic word next to a long URL can be rejected (false negatives), and
 * the threshold is a tunable constant rather than a calibrated value.
 */

use log::debug;
use serde::{Deserialize, Serialize};

/// Minimum share of Arabic codepoints for text to count as Arabic
pub const DEFAULT_ARABIC_THRESHOLD: f64 = 0.15;

/// Whether a codepoint belongs to one of the Arabic blocks
pub fn is_arabic_char(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'   // Arabic
        | '\u{0750}'..='\u{077F}' // Arabic Supplement
        | '\u{0870}'..='\u{089F}' // Arabic Extended-B
        | '\u{08A0}'..='\u{08FF}' // Arabic Extended-A
        | '\u{FB50}'..='\u{FDFF}' // Presentation Forms-A
        | '\u{FE70}'..='\u{FEFF}' // Presentation Forms-B
    )
}

/// Share of Arabic-block codepoints in `text`, 0.0 for empty text
pub fn coverage(text: &str) -> f64 {
    let (arabic, total) = text.chars().fold((0usize, 0usize), |(arabic, total), c| {
        (arabic + usize::from(is_arabic_char(c)), total + 1)
    });

    if total == 0 {
        0.0
    } else {
        arabic as f64 / total as f64
    }
}

/// `coverage(text) >= DEFAULT_ARABIC_THRESHOLD`
pub fn has_enough_arabic(text: &str) -> bool {
    has_enough_arabic_with(text, DEFAULT_ARABIC_THRESHOLD)
}

/// `coverage(text) >= threshold`; empty text is never enough
pub fn has_enough_arabic_with(text: &str, threshold: f64) -> bool {
    !text.is_empty() && coverage(text) >= threshold
}

/// Validator carrying a configured threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArabicValidator {
    /// Minimum coverage to accept
    pub threshold: f64,
}

impl Default for ArabicValidator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ARABIC_THRESHOLD,
        }
    }
}

impl ArabicValidator {
    /// Create a validator with a custom threshold
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Whether `text` passes
    pub fn accepts(&self, text: &str) -> bool {
        let passed = has_enough_arabic_with(text, self.threshold);
        debug!(
            "Arabic coverage {:.3} (threshold {:.2}) over {} chars: {}",
            coverage(text),
            self.threshold,
            text.chars().count(),
            if passed { "accepted" } else { "rejected" }
        );
        passed
    }

    /// Coverage of `text`
    pub fn coverage(&self, text: &str) -> f64 {
        coverage(text)
    }
}

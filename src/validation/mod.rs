/*!
 * Validation of translated content.
 *
 * - `arabic`: Arabic-script coverage heuristic used as the acceptance gate
 *   after every translation call and for author-supplied Arabic fields
 */

pub mod arabic;

// Re-export main types
pub use arabic::{ArabicValidator, DEFAULT_ARABIC_THRESHOLD, coverage, has_enough_arabic, has_enough_arabic_with};

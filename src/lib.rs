/*!
 * # mdxlate - MDX-preserving translation for a bilingual CMS
 *
 * A Rust library for translating English Markdown/MDX content into Arabic
 * without breaking the markup around it, and for round-tripping that
 * content through a rich-text editor.
 *
 * ## Features
 *
 * - Segment MDX into prose and protected spans (code, links, custom elements)
 * - Translate prose through LibreTranslate-compatible providers:
 *   - custom endpoint first, public mirrors as fallbacks
 *   - JSON requests with a form-encoded retry
 *   - per-call timeouts and jitter between providers
 * - Gate output on Arabic-script coverage
 * - Convert Markdown to a rich-text tree, to editor HTML, and back
 * - Keep custom MDX elements intact through editing with placeholder keys
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `segmenter`: prose/protected segmentation
 * - `tag_scanner`: custom element and expression scanning
 * - `placeholder`: custom element extraction and restoration
 * - `richtext`: Markdown/HTML to document tree and back
 * - `editor`: editor-facing conversion functions
 * - `translation`: machine translation:
 *   - `translation::client`: provider fallback chain
 *   - `translation::orchestrator`: plain and MDX entry points
 *   - `translation::cache`: optional memoization
 *   - `translation::rate_limit`: optional request gate
 * - `providers`: provider wire types and transports
 * - `validation`: Arabic coverage heuristic
 * - `app_config`: Configuration management
 * - `app_controller`: File workflow behind the command line
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod editor;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod placeholder;
pub mod providers;
pub mod richtext;
pub mod segmenter;
pub mod tag_scanner;
pub mod translation;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, ProviderError, SegmentationDegraded, TranslationError};
pub use placeholder::{Extraction, PlaceholderMap};
pub use segmenter::{Segment, Segmenter};
pub use translation::{FieldKind, Orchestrator, TranslationClient};
pub use validation::{ArabicValidator, has_enough_arabic};

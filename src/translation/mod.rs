/*!
 * Machine translation of CMS fields.
 *
 * This module contains the translation side of the pipeline:
 *
 * - `client`: provider fallback chain and paragraph-wise translation
 * - `orchestrator`: plain-field and MDX-preserving entry points
 * - `cache`: optional memoization of accepted translations
 * - `rate_limit`: optional request gate
 */

// Re-export main types for easier usage
pub use self::cache::{MemoryCache, NoCache, TranslationCache};
pub use self::client::TranslationClient;
pub use self::orchestrator::{DEFAULT_PENDING_MARKER, FieldKind, Orchestrator, is_pending};
pub use self::rate_limit::{FixedWindowRateLimiter, RateLimiter};

// Submodules
pub mod cache;
pub mod client;
pub mod orchestrator;
pub mod rate_limit;

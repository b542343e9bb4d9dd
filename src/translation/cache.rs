/*!
 * Translation caching collaborators.
 *
 * The orchestrator does not memoize on its own: repeated calls with the
 * same input go through the provider chain again. A caller that wants
 * memoization injects a `TranslationCache`:
 * - `NoCache`: the default, never stores anything
 * - `MemoryCache`: process-local map with hit/miss statistics
 *
 * Only validated translations are ever stored.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Cache key combining source text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source_text: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Storage for finished translations
pub trait TranslationCache: Send + Sync + Debug {
    /// Look up a translation
    fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String>;

    /// Remember a translation
    fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str);
}

/// Cache that never remembers anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl TranslationCache for NoCache {
    fn get(&self, _source_text: &str, _source_language: &str, _target_language: &str) -> Option<String> {
        None
    }

    fn store(&self, _source_text: &str, _source_language: &str, _target_language: &str, _translation: &str) {}
}

/// In-memory translation cache; clones share storage
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        (hits, misses, hit_rate)
    }

    /// Clear entries and statistics
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Translation cache cleared");
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl TranslationCache for MemoryCache {
    fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        let key = CacheKey::new(source_text, source_language, target_language);
        let found = self.entries.read().get(&key).cloned();

        match &found {
            Some(_) => {
                *self.hits.write() += 1;
                debug!(
                    "Cache hit for '{}' ({} -> {})",
                    truncate_text(source_text, 30),
                    source_language,
                    target_language
                );
            }
            None => {
                *self.misses.write() += 1;
                debug!(
                    "Cache miss for '{}' ({} -> {})",
                    truncate_text(source_text, 30),
                    source_language,
                    target_language
                );
            }
        }

        found
    }

    fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        let key = CacheKey::new(source_text, source_language, target_language);
        self.entries.write().insert(key, translation.to_string());
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

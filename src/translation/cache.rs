/*!
 * Translation caching functionality.
 *
 * Successful results are kept in memory, keyed by a SHA-256 digest of the
 * source text, language pair and method family. Nothing survives a restart.
 */

use log::debug;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::TranslationResult;
use crate::providers::Method;

/// Digest identifying one translation request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(source_text: &str, source_language: Option<&str>, target_language: &str, method: Method) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source_text.as_bytes());
        hasher.update([0u8]);
        hasher.update(source_language.unwrap_or("auto").as_bytes());
        hasher.update([0u8]);
        hasher.update(target_language.as_bytes());
        hasher.update([0u8]);
        hasher.update(method.as_str().as_bytes());
        let digest = hasher.finalize();
        Self(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 { self.hits as f64 / total as f64 } else { 0.0 }
    }
}

/// Translation cache for storing and retrieving results
#[derive(Debug, Clone)]
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, TranslationResult>>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
            enabled,
        }
    }

    /// Get a result from the cache
    pub fn get(&self, key: &CacheKey) -> Option<TranslationResult> {
        if !self.enabled {
            return None;
        }

        match self.cache.read().get(key) {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for {}", &key.as_str()[..12]);
                Some(result.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a result in the cache
    pub fn store(&self, key: CacheKey, result: &TranslationResult) {
        if !self.enabled {
            return;
        }
        debug!("Cached translation {}", &key.as_str()[..12]);
        self.cache.write().insert(key, result.clone());
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Clear the cache and its counters
    pub fn clear(&self) {
        self.cache.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Translation cache cleared");
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

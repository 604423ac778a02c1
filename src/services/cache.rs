//! Bounded cache of received result sets.
//!
//! Keys are the exact normalized query plus the request parameters; there is
//! no prefix reuse. Least-recently-used entries are evicted once the
//! capacity is exceeded.

use crate::types::{Params, Suggestion};
use lru::LruCache;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    params: Params,
}

/// LRU map from `(query, params)` to an ordered result set.
#[derive(Debug)]
pub struct ResponseCache {
    entries: LruCache<CacheKey, Vec<Suggestion>>,
}

impl ResponseCache {
    /// Creates a cache holding at most `capacity` result sets.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(non_zero(capacity)),
        }
    }

    /// Returns the cached results for an exact key, marking them recently used.
    pub fn get(&mut self, query: &str, params: &Params) -> Option<&[Suggestion]> {
        let key = CacheKey {
            query: query.to_string(),
            params: params.clone(),
        };
        self.entries.get(&key).map(Vec::as_slice)
    }

    /// Whether an exact key is cached, without touching recency.
    #[must_use]
    pub fn contains(&self, query: &str, params: &Params) -> bool {
        let key = CacheKey {
            query: query.to_string(),
            params: params.clone(),
        };
        self.entries.contains(&key)
    }

    /// Stores a result set, evicting the least recently used one if full.
    pub fn put(&mut self, query: &str, params: &Params, results: Vec<Suggestion>) {
        let key = CacheKey {
            query: query.to_string(),
            params: params.clone(),
        };
        if let Some((evicted, _)) = self.entries.push(key, results) {
            if evicted.query != query || evicted.params != *params {
                tracing::debug!("Evicted cached results for {:?}", evicted.query);
            }
        }
    }

    /// Changes the capacity, evicting the oldest entries if it shrinks.
    pub fn resize(&mut self, capacity: usize) {
        let capacity = non_zero(capacity);
        if capacity != self.entries.cap() {
            self.entries.resize(capacity);
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Request Cache
//!
//! Bounded map from a serialized request body to its (possibly still
//! pending) result. Identical requests share one entry, so keystroke-driven
//! searches that repeat a body reuse the same network call.
//!
//! # Flow
//!
//! ```text
//! search(body)
//!       │
//!       ▼
//! ┌─────────────────────────────┐
//! │  entry(body)                │
//! │  occupied → clone value     │
//! │  vacant   → make() + insert │
//! └─────────────────────────────┘
//!       │
//!       └─→ oldest entries evicted past max_entries
//! ```

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bounded request-body cache with oldest-first eviction
pub struct RequestCache<V> {
    /// Cache: request body → value
    cache: DashMap<String, V>,
    /// Insertion order for eviction (oldest first)
    order: Mutex<VecDeque<String>>,
    /// Maximum number of entries
    max_entries: usize,
    /// Cache hits counter
    hits: AtomicU64,
    /// Cache misses counter
    misses: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct RequestCacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Current number of entries
    pub entry_count: usize,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

impl<V: Clone> RequestCache<V> {
    /// Create a new cache with the given max entries
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached value for `key`, if any
    pub fn get(&self, key: &str) -> Option<V> {
        match self.cache.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Return the cached value, or build, insert and return a new one.
    ///
    /// The second element is `true` on a hit. Lookup and insert are atomic
    /// per key, so concurrent callers with the same key get the same value.
    pub fn get_or_insert_with(&self, key: &str, make: impl FnOnce() -> V) -> (V, bool) {
        if self.max_entries == 0 {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return (make(), false);
        }

        let (value, hit) = match self.cache.entry(key.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), true),
            Entry::Vacant(entry) => {
                let value = make();
                entry.insert(value.clone());
                (value, false)
            }
        };

        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            // Entry guard is released; safe to touch other shards
            self.order.lock().push_back(key.to_string());
            self.evict_over_capacity();
        }
        (value, hit)
    }

    fn evict_over_capacity(&self) {
        let mut order = self.order.lock();
        while self.cache.len() > self.max_entries {
            match order.pop_front() {
                Some(old_key) => {
                    self.cache.remove(&old_key);
                }
                None => break,
            }
        }
    }

    /// Drop the entry for `key` only while `predicate` holds for its value.
    ///
    /// A failed request removes its own entry this way, never a newer one
    /// inserted under the same key.
    pub fn remove_if(&self, key: &str, predicate: impl FnOnce(&V) -> bool) -> bool {
        let removed = self.cache.remove_if(key, |_, value| predicate(value)).is_some();
        if removed {
            self.order.lock().retain(|k| k != key);
        }
        removed
    }

    /// Get cache statistics
    pub fn stats(&self) -> RequestCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        RequestCacheStats {
            hits,
            misses,
            entry_count: self.cache.len(),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
        self.order.lock().clear();
    }
}

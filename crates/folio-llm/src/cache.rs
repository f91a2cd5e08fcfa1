//! TTL caches for responses and embeddings.
//!
//! Keys are SHA-256 digests of the request content, so prompts never
//! appear in cache keys or logs. Eviction is lazy (on read) plus an
//! oldest-entry sweep when the capacity cap is hit on insert.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Build a cache key from request parts.
#[must_use]
pub fn cache_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

struct Entry<V> {
    inserted: Instant,
    value: V,
}

/// Hit/miss counters for a cache.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups that returned a live entry.
    pub hits: u64,
    /// Lookups that found nothing (or an expired entry).
    pub misses: u64,
    /// Live entries.
    pub entries: usize,
}

/// A bounded map whose entries expire after a fixed TTL.
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the given entry lifetime and capacity.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a key, expiring the entry if it is past its TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted.elapsed() < self.ttl {
                let _ = self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            drop(entry);
            let _ = self.entries.remove(key);
        }
        let _ = self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert a value, evicting expired (then oldest) entries at capacity.
    pub fn insert(&self, key: String, value: V) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries {
            self.evict_expired();
        }
        while self.entries.len() >= self.max_entries {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|e| e.value().inserted)
                .map(|e| e.key().clone())
            else {
                break;
            };
            let _ = self.entries.remove(&oldest);
        }
        let _ = self.entries.insert(
            key,
            Entry {
                inserted: Instant::now(),
                value,
            },
        );
    }

    /// Drop all entries past their TTL.
    pub fn evict_expired(&self) {
        self.entries.retain(|_, entry| entry.inserted.elapsed() < self.ttl);
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

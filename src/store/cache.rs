//! Response cache store
//!
//! Key-value cache of the last successful `(data, envelope)` per request key.
//! Last-write-wins, no expiry: entries are retained for the process lifetime.
//! That unbounded retention mirrors the upstream contract and is deliberate;
//! callers opt into caching per request, typically for idempotent reads.

use dashmap::DashMap;
use serde_json::Value;

use crate::core::Envelope;

/// One cached successful response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub envelope: Envelope,
}

/// Cache of successful responses keyed by request identity.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get the cached entry for a key, if any.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store a successful response, replacing any previous entry.
    pub fn set(&self, key: String, data: Value, envelope: Envelope) {
        log::debug!("Caching response for key: {key}");
        self.entries.insert(key, CacheEntry { data, envelope });
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

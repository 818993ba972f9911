// src/api/cache.rs
//! In-process response cache for entities fetched during crawls.
//!
//! One partition per [`EntityKind`], keyed by entity id. Entries are only
//! written after a successful fetch and are never evicted or expired: the
//! cache lives as long as the process. Callers that host the crawler in a
//! long-running server should put an eviction layer in front of it.

use crate::types::EntityKind;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;

static SHARED: Lazy<Arc<EntityCache>> = Lazy::new(|| Arc::new(EntityCache::new()));

/// Read-through store of raw payloads, partitioned by entity kind.
///
/// Safe to share between any number of concurrent crawl branches; the
/// last write for a key wins.
#[derive(Debug)]
pub struct EntityCache {
    partitions: [DashMap<String, Value>; 5],
}

impl EntityCache {
    /// Creates an empty, isolated cache.
    pub fn new() -> Self {
        Self {
            partitions: std::array::from_fn(|_| DashMap::new()),
        }
    }

    /// The process-wide cache shared by every crawl that does not bring its own.
    pub fn shared() -> Arc<EntityCache> {
        Arc::clone(&SHARED)
    }

    pub fn get(&self, kind: EntityKind, key: &str) -> Option<Value> {
        let hit = self.partitions[kind.index()]
            .get(key)
            .map(|entry| entry.value().clone());
        if hit.is_some() {
            log::debug!("Cache hit: {} {}", kind, key);
        } else {
            log::debug!("Cache miss: {} {}", kind, key);
        }
        hit
    }

    pub fn put(&self, kind: EntityKind, key: impl Into<String>, payload: Value) {
        self.partitions[kind.index()].insert(key.into(), payload);
    }

    /// Number of entries held for `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.partitions[kind.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(DashMap::is_empty)
    }

    /// Key under which a property detail is stored: owning page, then property.
    pub fn property_key(document_id: &str, property_id: &str) -> String {
        format!("{}:{}", document_id, property_id)
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

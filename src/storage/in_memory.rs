//! In-memory implementations for testing and development
//!
//! Both types use `RwLock` for thread-safe access and hold everything in
//! process memory: an entity graph preloaded with relation values, and a
//! cache store with tag grouping and passive TTL expiry.

use crate::cache::CacheStore;
use crate::core::entity::{Entity, EntityGraph, RelationValue};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Entity graph backed by a preloaded relation map.
///
/// Relation values are keyed by `(entity type, key, field)`; anything not
/// inserted reads as absent, which the engine renders as null.
#[derive(Default)]
pub struct InMemoryEntityGraph {
    relations: RwLock<HashMap<(String, Uuid, String), RelationValue>>,
}

impl InMemoryEntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload the value of one relation field
    pub fn insert(&self, entity: &Entity, field: &str, value: RelationValue) {
        if let Ok(mut relations) = self.relations.write() {
            relations.insert(
                (entity.type_name().to_string(), entity.key(), field.to_string()),
                value,
            );
        }
    }
}

impl EntityGraph for InMemoryEntityGraph {
    fn related(&self, entity: &Entity, field: &str) -> Option<RelationValue> {
        let relations = self.relations.read().ok()?;
        relations
            .get(&(entity.type_name().to_string(), entity.key(), field.to_string()))
            .cloned()
    }
}

struct CacheEntry {
    value: Value,
    tags: Vec<String>,
    expires_at: Instant,
}

/// Cache store with tag support and passive TTL expiry
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write().ok()?;

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: Value, tags: &[String], ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    tags: tags.to_vec(),
                    expires_at: Instant::now() + ttl,
                },
            );
        }
    }

    fn forget(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    fn supports_tags(&self) -> bool {
        true
    }

    fn forget_by_tag(&self, tag: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        }
    }
}

//! Result caching for projection outputs
//!
//! Memoizes any expensive read under a key derived from the
//! response-shape-affecting inputs, with TTL and tag-based bulk
//! invalidation. The cache gives no single-flight guarantee: concurrent
//! misses for the same key may both compute, which is acceptable because
//! projection is pure.

use crate::directives::DirectiveSet;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(20 * 60);

/// Request parameters hashed into the key unless the caller overrides the
/// allow-list
pub const DEFAULT_ALLOWED_PARAMS: [&str; 2] = ["page", "number"];

/// Backing store contract.
///
/// Stores that cannot group entries by tag keep the default
/// `supports_tags` of false; tag operations then degrade to a logged no-op
/// while per-key operations keep working.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn put(&self, key: &str, value: Value, tags: &[String], ttl: Duration);

    fn forget(&self, key: &str);

    fn supports_tags(&self) -> bool {
        false
    }

    fn forget_by_tag(&self, _tag: &str) {}
}

/// Builder for a cache key covering everything that legitimately changes
/// the output: format, array forcing, the resolved include/exclude path
/// sets, and an allow-listed subset of request parameters.
#[derive(Debug, Clone, Default)]
pub struct CacheKey {
    base: String,
    output_format: String,
    force_array: bool,
    includes: Vec<String>,
    excludes: Vec<String>,
    params: Vec<(String, String)>,
}

impl CacheKey {
    /// Start a key under a caller-chosen base (e.g. the endpoint name)
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    /// The output format identifier the boundary layer will serialize to
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    /// Whether array output is forced regardless of format
    pub fn force_array(mut self, force: bool) -> Self {
        self.force_array = force;
        self
    }

    /// The resolved include/exclude path sets of the request
    pub fn directives(mut self, directives: &DirectiveSet) -> Self {
        self.includes = directives.include_paths().map(str::to_string).collect();
        self.excludes = directives.exclude_paths().map(str::to_string).collect();
        self
    }

    /// Add the allow-listed subset of the request parameters.
    ///
    /// Order-insensitive: parameters are sorted before hashing.
    pub fn params<'a, I>(mut self, params: I, allowed: &[&str]) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.params = params
            .into_iter()
            .filter(|(key, _)| allowed.contains(key))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        self.params.sort();
        self
    }

    /// Produce the final key: `{base}::{content hash}`
    pub fn build(&self) -> String {
        let mut hasher = Sha256::new();

        hasher.update(self.output_format.as_bytes());
        hasher.update([0u8]);
        hasher.update([self.force_array as u8]);
        hasher.update([0u8]);

        for path in &self.includes {
            hasher.update(path.as_bytes());
            hasher.update([1u8]);
        }
        hasher.update([0u8]);

        for path in &self.excludes {
            hasher.update(path.as_bytes());
            hasher.update([1u8]);
        }
        hasher.update([0u8]);

        for (key, value) in &self.params {
            hasher.update(key.as_bytes());
            hasher.update([2u8]);
            hasher.update(value.as_bytes());
            hasher.update([1u8]);
        }

        format!("{}::{}", self.base, hex::encode(hasher.finalize()))
    }
}

/// Memoizes expensive reads with TTL and tag-based invalidation
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    enabled: bool,
}

impl ResultCache {
    /// Tag added to every tagged write, so a deployment can flush all
    /// projection output at once
    pub const SHARED_TAG: &'static str = "facet::projections";

    pub fn new(store: Arc<dyn CacheStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    /// Read through the cache, computing on miss.
    ///
    /// `force_invalidate` evicts the key before the read so the compute
    /// result replaces any stale value. With the cache disabled the
    /// closure runs unconditionally.
    pub fn get_or_compute<F, E>(
        &self,
        key: &str,
        tags: &[String],
        ttl: Duration,
        force_invalidate: bool,
        compute: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Result<Value, E>,
    {
        if !self.enabled {
            return compute();
        }

        if !tags.is_empty() && !self.store.supports_tags() {
            tracing::warn!(
                tags = %tags.join(", "),
                "cache store does not support tags; tag grouping skipped"
            );
        }

        if force_invalidate {
            self.store.forget(key);
        }

        if let Some(hit) = self.store.get(key) {
            return Ok(hit);
        }

        let value = compute()?;

        let mut all_tags = tags.to_vec();
        all_tags.push(Self::SHARED_TAG.to_string());
        self.store.put(key, value.clone(), &all_tags, ttl);

        Ok(value)
    }

    /// Evict one key
    pub fn forget(&self, key: &str) {
        self.store.forget(key);
    }

    /// Evict every entry carrying `tag`. Degrades to a logged no-op when
    /// the store has no tag support.
    pub fn invalidate_tag(&self, tag: &str) {
        if self.store.supports_tags() {
            self.store.forget_by_tag(tag);
        } else {
            tracing::warn!(tag, "cache store does not support tags; bulk invalidation skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryCacheStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> ResultCache {
        ResultCache::new(Arc::new(InMemoryCacheStore::new()), true)
    }

    fn key_for(include: &str, exclude: &str) -> String {
        CacheKey::new("orders.index")
            .output_format("application/json")
            .directives(&DirectiveSet::new(include, exclude))
            .build()
    }

    #[test]
    fn test_identical_requests_share_a_key() {
        assert_eq!(key_for("tags,customer", ""), key_for("tags,customer", ""));
    }

    #[test]
    fn test_exclude_changes_the_key() {
        assert_ne!(key_for("tags,customer", ""), key_for("tags,customer", "tags"));
    }

    #[test]
    fn test_format_and_array_flag_change_the_key() {
        let base = CacheKey::new("orders.index").output_format("application/json");
        assert_ne!(
            base.clone().build(),
            base.clone().output_format("application/xml").build()
        );
        assert_ne!(base.clone().build(), base.clone().force_array(true).build());
    }

    #[test]
    fn test_params_respect_allow_list_and_order() {
        let with_page = CacheKey::new("k")
            .params([("page", "2"), ("secret", "x")], &DEFAULT_ALLOWED_PARAMS)
            .build();
        let with_secret_changed = CacheKey::new("k")
            .params([("secret", "y"), ("page", "2")], &DEFAULT_ALLOWED_PARAMS)
            .build();
        let other_page = CacheKey::new("k")
            .params([("page", "3")], &DEFAULT_ALLOWED_PARAMS)
            .build();

        assert_eq!(with_page, with_secret_changed);
        assert_ne!(with_page, other_page);
    }

    #[test]
    fn test_miss_computes_and_hit_reuses() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        let compute = || -> Result<Value, ()> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"data": []}))
        };

        let first = cache
            .get_or_compute("k", &[], DEFAULT_TTL, false, compute)
            .unwrap();
        let second = cache
            .get_or_compute("k", &[], DEFAULT_TTL, false, || -> Result<Value, ()> {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"data": ["fresh"]}))
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_force_invalidate_recomputes() {
        let cache = cache();

        cache
            .get_or_compute("k", &[], DEFAULT_TTL, false, || -> Result<Value, ()> {
                Ok(json!("stale"))
            })
            .unwrap();

        let fresh = cache
            .get_or_compute("k", &[], DEFAULT_TTL, true, || -> Result<Value, ()> {
                Ok(json!("fresh"))
            })
            .unwrap();

        assert_eq!(fresh, json!("fresh"));
    }

    #[test]
    fn test_disabled_cache_always_computes() {
        let cache = ResultCache::new(Arc::new(InMemoryCacheStore::new()), false);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            cache
                .get_or_compute("k", &[], DEFAULT_TTL, false, || -> Result<Value, ()> {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(1))
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_tag_invalidation_evicts_tagged_entries() {
        let cache = cache();
        let tags = vec!["orders".to_string()];

        cache
            .get_or_compute("k", &tags, DEFAULT_TTL, false, || -> Result<Value, ()> {
                Ok(json!("v1"))
            })
            .unwrap();

        cache.invalidate_tag("orders");

        let fresh = cache
            .get_or_compute("k", &tags, DEFAULT_TTL, false, || -> Result<Value, ()> {
                Ok(json!("v2"))
            })
            .unwrap();
        assert_eq!(fresh, json!("v2"));
    }

    #[test]
    fn test_shared_tag_covers_every_entry() {
        let cache = cache();

        cache
            .get_or_compute("a", &[], DEFAULT_TTL, false, || -> Result<Value, ()> {
                Ok(json!(1))
            })
            .unwrap();
        cache
            .get_or_compute("b", &["x".to_string()], DEFAULT_TTL, false, || -> Result<Value, ()> {
                Ok(json!(2))
            })
            .unwrap();

        cache.invalidate_tag(ResultCache::SHARED_TAG);

        let recomputed = cache
            .get_or_compute("a", &[], DEFAULT_TTL, false, || -> Result<Value, ()> {
                Ok(json!("new"))
            })
            .unwrap();
        assert_eq!(recomputed, json!("new"));
    }

    #[test]
    fn test_compute_errors_propagate_and_are_not_cached() {
        let cache = cache();

        let err = cache.get_or_compute("k", &[], DEFAULT_TTL, false, || -> Result<Value, &str> {
            Err("boom")
        });
        assert_eq!(err.unwrap_err(), "boom");

        let ok = cache
            .get_or_compute("k", &[], DEFAULT_TTL, false, || -> Result<Value, &str> {
                Ok(json!("recovered"))
            })
            .unwrap();
        assert_eq!(ok, json!("recovered"));
    }
}

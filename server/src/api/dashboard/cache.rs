//! Dashboard read-through cache
//!
//! The dashboard aggregates are recomputed from the ledger on demand and
//! cached here, keyed by a global write version. Every write anywhere in
//! the API layer bumps the version, which invalidates all cached snapshots
//! at once. The ledger core knows nothing about this cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

struct CachedEntry {
    version: u64,
    value: serde_json::Value,
}

pub struct DashboardCache {
    version: AtomicU64,
    entries: RwLock<HashMap<String, CachedEntry>>,
}

impl DashboardCache {
    pub fn new() -> Self {
        Self {
            version: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every cached snapshot by moving the version forward
    pub fn invalidate(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
    }

    /// A snapshot for `key`, if one exists for the current version
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let current = self.version.load(Ordering::Relaxed);
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.version == current)
            .map(|e| e.value.clone())
    }

    /// Current write version. Capture this before computing a snapshot and
    /// hand it back to [`DashboardCache::put`]; a write that lands in
    /// between moves the version forward, so the late snapshot is stored
    /// as already-stale instead of masking the write.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    /// Store a snapshot computed at `version`
    pub async fn put(&self, key: &str, version: u64, value: serde_json::Value) {
        let mut entries = self.entries.write().await;
        // Stale entries for other keys are overwritten on their next read
        entries.insert(key.to_string(), CachedEntry { version, value });
    }
}

impl Default for DashboardCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_hit_until_invalidated() {
        let cache = DashboardCache::new();

        assert!(cache.get("stats").await.is_none());

        let v = cache.version();
        cache.put("stats", v, json!({"sales_today": 10.0})).await;
        assert_eq!(
            cache.get("stats").await,
            Some(json!({"sales_today": 10.0}))
        );

        cache.invalidate();
        assert!(cache.get("stats").await.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = DashboardCache::new();

        let v = cache.version();
        cache.put("stats", v, json!(1)).await;
        cache.put("chart:6", v, json!(2)).await;

        assert_eq!(cache.get("stats").await, Some(json!(1)));
        assert_eq!(cache.get("chart:6").await, Some(json!(2)));
        assert!(cache.get("chart:12").await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_raced_by_write_stored_as_stale() {
        let cache = DashboardCache::new();

        // Reader misses and captures the version before computing
        assert!(cache.get("stats").await.is_none());
        let v = cache.version();

        // A settlement lands while the snapshot is being built
        cache.invalidate();

        // The late store must not become the current snapshot
        cache.put("stats", v, json!({"open_fiado_total": 50.0})).await;
        assert!(cache.get("stats").await.is_none());

        let v = cache.version();
        cache.put("stats", v, json!({"open_fiado_total": 20.0})).await;
        assert_eq!(
            cache.get("stats").await,
            Some(json!({"open_fiado_total": 20.0}))
        );
    }
}

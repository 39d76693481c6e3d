//! Read-through response cache with a validity window.
//!
//! Successful completions are stored keyed by `(fingerprint, task kind)`
//! and reused within a validity window (default 24 hours). Expiry is a
//! filter at read time on the entry's `created_at` — entries are never
//! eagerly deleted, a stale entry simply reads as a miss.
//!
//! The orchestrator treats writes as fire-and-forget: a failed `put` is
//! logged and swallowed, never failing the request. Fallback output is
//! never written here — only real upstream completions are.
//!
//! [`CacheStore`] is the backend seam. The bundled [`MemoryCacheStore`]
//! uses moka for capacity management; a shared backend (e.g. redis for
//! multiple replicas) implements the same trait and is injected via
//! [`OrchestratorBuilder::cache`](crate::OrchestratorBuilder::cache).

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tokio::time::Instant;

use crate::fingerprint::Fingerprint;
use crate::telemetry;
use crate::types::TaskKind;
use crate::Result;

/// Pluggable cache backend keyed by fingerprint + task kind.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up cached text. Entries past the validity window read as `None`.
    async fn get(&self, fingerprint: &Fingerprint, kind: TaskKind) -> Result<Option<String>>;

    /// Store generated text for future reuse.
    async fn put(&self, fingerprint: &Fingerprint, kind: TaskKind, text: &str) -> Result<()>;
}

/// Configuration for [`MemoryCacheStore`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
    /// Window after which an entry reads as a miss. Default: 24 hours.
    pub validity_window: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            validity_window: Duration::from_secs(24 * 3600),
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the validity window.
    pub fn validity_window(mut self, window: Duration) -> Self {
        self.validity_window = window;
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    created_at: Instant,
}

/// In-memory cache store backed by moka.
///
/// Capacity is bounded by moka's LRU; freshness is hermod's own read-time
/// check against `created_at`, so the validity-window contract holds
/// regardless of backend eviction behaviour.
pub struct MemoryCacheStore {
    entries: Cache<String, CacheEntry>,
    validity_window: Duration,
}

impl MemoryCacheStore {
    /// Create a store from the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder().max_capacity(config.max_entries).build();
        Self {
            entries,
            validity_window: config.validity_window,
        }
    }

    fn entry_key(fingerprint: &Fingerprint, kind: TaskKind) -> String {
        format!("{}:{}", kind.as_str(), fingerprint)
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, fingerprint: &Fingerprint, kind: TaskKind) -> Result<Option<String>> {
        let key = Self::entry_key(fingerprint, kind);
        let hit = self
            .entries
            .get(&key)
            .await
            .filter(|entry| entry.created_at.elapsed() <= self.validity_window);
        match hit {
            Some(entry) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "task" => kind.as_str())
                    .increment(1);
                Ok(Some(entry.text))
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "task" => kind.as_str())
                    .increment(1);
                Ok(None)
            }
        }
    }

    async fn put(&self, fingerprint: &Fingerprint, kind: TaskKind, text: &str) -> Result<()> {
        let key = Self::entry_key(fingerprint, kind);
        self.entries
            .insert(
                key,
                CacheEntry {
                    text: text.to_string(),
                    created_at: Instant::now(),
                },
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;

    fn fp(prompt: &str) -> Fingerprint {
        fingerprint(TaskKind::Chat, prompt, None, None)
    }

    #[tokio::test]
    async fn miss_on_empty_store() {
        let store = MemoryCacheStore::default();
        let got = store.get(&fp("hello"), TaskKind::Chat).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn put_then_get_within_window() {
        let store = MemoryCacheStore::default();
        let key = fp("hello");
        store.put(&key, TaskKind::Chat, "cached text").await.unwrap();
        let got = store.get(&key, TaskKind::Chat).await.unwrap();
        assert_eq!(got.as_deref(), Some("cached text"));
    }

    #[tokio::test]
    async fn same_fingerprint_different_kind_is_independent() {
        let store = MemoryCacheStore::default();
        let key = fp("hello");
        store.put(&key, TaskKind::Chat, "chat text").await.unwrap();
        let got = store.get(&key, TaskKind::Email).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_reads_as_miss() {
        let config = CacheConfig::new().validity_window(Duration::from_secs(3600));
        let store = MemoryCacheStore::new(&config);
        let key = fp("hello");
        store.put(&key, TaskKind::Chat, "cached text").await.unwrap();

        tokio::time::advance(Duration::from_secs(3601)).await;

        // Entry was never deleted, only filtered at read time
        let got = store.get(&key, TaskKind::Chat).await.unwrap();
        assert!(got.is_none());
        store.entries.run_pending_tasks().await;
        assert_eq!(store.entries.entry_count(), 1);
    }

    #[tokio::test]
    async fn overwrite_refreshes_entry() {
        let store = MemoryCacheStore::default();
        let key = fp("hello");
        store.put(&key, TaskKind::Chat, "first").await.unwrap();
        store.put(&key, TaskKind::Chat, "second").await.unwrap();
        let got = store.get(&key, TaskKind::Chat).await.unwrap();
        assert_eq!(got.as_deref(), Some("second"));
    }
}

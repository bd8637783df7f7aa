// ABOUTME: In-memory cache store with LRU eviction and TTL support
// ABOUTME: Lazy expiry on read plus an optional background sweep task
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::CacheStore;
use crate::errors::AuthResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default entry bound. Provider login flows are minutes-long, so even a busy
/// process never holds more than a few thousand live states.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn remaining_ttl(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }
}

/// In-memory store with LRU eviction and per-entry TTL.
///
/// `Arc<RwLock<LruCache>>` is shared between cache operations and the optional
/// sweep task spawned by [`MemoryCacheStore::with_background_sweep`]. Expired
/// entries are also dropped lazily on read, so the sweep only bounds memory,
/// never correctness.
#[derive(Clone)]
pub struct MemoryCacheStore {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    shutdown_tx: Option<Arc<tokio::sync::mpsc::Sender<()>>>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store bounded to `max_entries` live entries.
    #[must_use]
    pub fn with_capacity(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_MAX_ENTRIES).expect("nonzero constant"));
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            shutdown_tx: None,
        }
    }

    /// Create a store that additionally sweeps expired entries on an interval.
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn with_background_sweep(max_entries: usize, sweep_interval: Duration) -> Self {
        let mut cache = Self::with_capacity(max_entries);
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
        let store = cache.store.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        Self::sweep_expired(&store).await;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("cache sweep task received shutdown signal");
                        break;
                    }
                }
            }
        });

        cache.shutdown_tx = Some(Arc::new(shutdown_tx));
        cache
    }

    async fn sweep_expired(store: &Arc<RwLock<LruCache<String, CacheEntry>>>) {
        let mut guard = store.write().await;

        // Collect first; LruCache cannot be mutated while iterating
        let expired: Vec<String> = guard
            .iter()
            .filter_map(|(k, v)| v.is_expired().then(|| k.clone()))
            .collect();
        for key in &expired {
            guard.pop(key);
        }

        let removed = expired.len();
        drop(guard);
        if removed > 0 {
            tracing::debug!("swept {} expired state entries", removed);
        }
    }

    /// Remaining TTL of a live entry; `None` when absent or expired.
    /// Mainly useful for tests and diagnostics.
    pub async fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let store = self.store.read().await;
        store
            .peek(key)
            .filter(|entry| !entry.is_expired())
            .and_then(CacheEntry::remaining_ttl)
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let mut store = self.store.write().await;

        // LruCache::get is mutable (updates access order)
        if let Some(entry) = store.get(key) {
            if entry.is_expired() {
                store.pop(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        let entry = CacheEntry::new(value.to_owned(), ttl);
        // LruCache evicts the least-recently-used entry automatically on push
        self.store.write().await.push(key.to_owned(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        self.store.write().await.pop(key);
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

impl Drop for MemoryCacheStore {
    fn drop(&mut self) {
        // The sweep task exits once all senders are gone; try_send just
        // hurries it along when this is the last clone.
        if let Some(tx) = &self.shutdown_tx {
            if let Err(e) = tx.try_send(()) {
                tracing::debug!(error = ?e, "cache shutdown signal send failed (channel likely closed)");
            }
        }
    }
}

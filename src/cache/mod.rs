// ABOUTME: Anti-forgery state cache abstraction with pluggable backends
// ABOUTME: Binds an authorization attempt to its callback; in-memory and Redis variants
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

/// In-memory cache implementation
pub mod memory;
/// Redis cache implementation
pub mod redis;

use crate::errors::AuthResult;
use std::sync::Arc;
use std::time::Duration;

pub use memory::MemoryCacheStore;
pub use redis::RedisCacheStore;

/// Key/value store with TTL backing anti-forgery state and transient tokens.
///
/// This store is the sole source of truth binding an authorization attempt to
/// its callback: losing an entry causes a spurious login failure, duplicating
/// one would bypass forgery protection. Implementations must guarantee that a
/// `get` after the TTL elapses returns `None`, and that a `set` is visible to
/// other callers of the same instance once it returns.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value; `None` when absent or expired.
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Store a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()>;

    /// Remove a single entry. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> AuthResult<()>;

    /// Remove all entries owned by this store.
    async fn clear(&self) -> AuthResult<()>;
}

/// Process-wide fallback store, created at first use and shared for the
/// process lifetime. Used only when a caller supplies no store of their own;
/// multi-instance deployments must inject a [`RedisCacheStore`] instead, since
/// callbacks may land on a different instance than the one that minted the
/// state.
pub fn default_cache_store() -> Arc<dyn CacheStore> {
    static INSTANCE: std::sync::OnceLock<Arc<MemoryCacheStore>> = std::sync::OnceLock::new();
    INSTANCE
        .get_or_init(|| Arc::new(MemoryCacheStore::with_capacity(memory::DEFAULT_MAX_ENTRIES)))
        .clone()
}

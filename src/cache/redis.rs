// ABOUTME: Redis cache store with connection pooling and native TTL
// ABOUTME: Shared state backend for multi-instance deployments
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use super::CacheStore;
use crate::errors::{AuthError, AuthResult};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{error, info};

/// Namespace prefix so the store can share a Redis instance with other
/// applications.
const KEY_PREFIX: &str = "omniauth:";

/// Redis-backed store using `ConnectionManager` for automatic reconnection.
///
/// TTL is enforced natively via `SETEX`, so expiry holds across process
/// restarts and is shared by every instance pointing at the same Redis.
#[derive(Clone)]
pub struct RedisCacheStore {
    manager: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to Redis at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Cache`] when the client cannot be created or the
    /// initial connection fails.
    pub async fn connect(redis_url: &str) -> AuthResult<Self> {
        Self::connect_with_timeouts(redis_url, Duration::from_secs(5), Duration::from_secs(5)).await
    }

    /// Connect with explicit connection and response timeouts.
    pub async fn connect_with_timeouts(
        redis_url: &str,
        connection_timeout: Duration,
        response_timeout: Duration,
    ) -> AuthResult<Self> {
        info!(
            "connecting to Redis state store (timeout={}s)",
            connection_timeout.as_secs()
        );

        let client = redis::Client::open(redis_url)
            .map_err(|e| AuthError::Cache(format!("failed to create Redis client: {e}")))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(connection_timeout)
            .set_response_timeout(response_timeout);

        let manager = ConnectionManager::new_with_config(client, manager_config)
            .await
            .map_err(|e| AuthError::Cache(format!("failed to connect to Redis: {e}")))?;

        info!("connected to Redis state store");
        Ok(Self { manager })
    }

    fn full_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(Self::full_key(key)).await.map_err(|e| {
            error!("Redis GET failed: {}", e);
            AuthError::Cache(e.to_string())
        })?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        let mut conn = self.manager.clone();
        // SETEX sets value and expiry atomically
        conn.set_ex::<_, _, ()>(Self::full_key(key), value, ttl.as_secs())
            .await
            .map_err(|e| {
                error!("Redis SET failed: {}", e);
                AuthError::Cache(e.to_string())
            })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn.del(Self::full_key(key)).await.map_err(|e| {
            error!("Redis DEL failed: {}", e);
            AuthError::Cache(e.to_string())
        })?;
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        // Only touch keys in our namespace; the instance may be shared.
        let pattern = format!("{KEY_PREFIX}*");
        let mut conn = self.manager.clone();
        let mut cursor = 0u64;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| {
                    error!("Redis SCAN failed during clear: {}", e);
                    AuthError::Cache(e.to_string())
                })?;

            if !keys.is_empty() {
                let _: u64 = conn.del(&keys).await.map_err(|e| {
                    error!("Redis DEL failed during clear: {}", e);
                    AuthError::Cache(e.to_string())
                })?;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(())
    }
}

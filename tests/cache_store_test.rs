// ABOUTME: Behavioral tests for the in-memory cache store: TTL expiry,
// ABOUTME: deletion, bounded capacity, and background sweeping
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::Result;
use omniauth::cache::MemoryCacheStore;
use omniauth::CacheStore;
use std::time::Duration;

#[tokio::test]
async fn test_set_get_roundtrip() -> Result<()> {
    let cache = MemoryCacheStore::new();
    cache.set("github:state:abc", "pending", Duration::from_secs(60)).await?;
    assert_eq!(
        cache.get("github:state:abc").await?.as_deref(),
        Some("pending")
    );
    assert_eq!(cache.get("github:state:missing").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_entries_expire_after_ttl() -> Result<()> {
    let cache = MemoryCacheStore::new();
    cache.set("k", "v", Duration::from_millis(30)).await?;
    assert!(cache.get("k").await?.is_some());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(cache.get("k").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_delete_removes_the_entry() -> Result<()> {
    let cache = MemoryCacheStore::new();
    cache.set("k", "v", Duration::from_secs(60)).await?;
    cache.delete("k").await?;
    assert_eq!(cache.get("k").await?, None);

    // Deleting a missing key is not an error.
    cache.delete("k").await?;
    Ok(())
}

#[tokio::test]
async fn test_overwrite_replaces_value_and_ttl() -> Result<()> {
    let cache = MemoryCacheStore::new();
    cache.set("k", "first", Duration::from_millis(20)).await?;
    cache.set("k", "second", Duration::from_secs(60)).await?;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.get("k").await?.as_deref(), Some("second"));
    Ok(())
}

#[tokio::test]
async fn test_remaining_ttl_counts_down() -> Result<()> {
    let cache = MemoryCacheStore::new();
    cache.set("k", "v", Duration::from_secs(300)).await?;

    let remaining = cache.remaining_ttl("k").await.expect("entry present");
    assert!(remaining <= Duration::from_secs(300));
    assert!(remaining > Duration::from_secs(295));

    assert_eq!(cache.remaining_ttl("missing").await, None);
    Ok(())
}

#[tokio::test]
async fn test_capacity_bound_evicts_least_recently_used() -> Result<()> {
    let cache = MemoryCacheStore::with_capacity(2);
    cache.set("a", "1", Duration::from_secs(60)).await?;
    cache.set("b", "2", Duration::from_secs(60)).await?;
    cache.set("c", "3", Duration::from_secs(60)).await?;

    assert_eq!(cache.get("a").await?, None);
    assert_eq!(cache.get("b").await?.as_deref(), Some("2"));
    assert_eq!(cache.get("c").await?.as_deref(), Some("3"));
    Ok(())
}

#[tokio::test]
async fn test_clear_empties_the_store() -> Result<()> {
    let cache = MemoryCacheStore::new();
    cache.set("a", "1", Duration::from_secs(60)).await?;
    cache.set("b", "2", Duration::from_secs(60)).await?;
    cache.clear().await?;
    assert_eq!(cache.get("a").await?, None);
    assert_eq!(cache.get("b").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_background_sweep_reclaims_expired_entries() -> Result<()> {
    let cache = MemoryCacheStore::with_background_sweep(16, Duration::from_millis(20));
    cache.set("doomed", "v", Duration::from_millis(10)).await?;
    cache.set("kept", "v", Duration::from_secs(60)).await?;

    tokio::time::sleep(Duration::from_millis(100)).await;

    // The swept entry is gone even without a lazy-expiry read.
    assert_eq!(cache.remaining_ttl("doomed").await, None);
    assert!(cache.remaining_ttl("kept").await.is_some());
    Ok(())
}

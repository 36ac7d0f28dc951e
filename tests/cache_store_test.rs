//! Integration tests for the shared TTL cache store
//!
//! Exercises the cache the way reporting and CLI layers use it: directly,
//! from many tasks at once, with pattern invalidation.

use std::sync::Arc;
use std::time::Duration;
use ticketlens::prelude::*;

fn store() -> Arc<CacheManager<String>> {
    Arc::new(CacheManager::new(CacheConfig::new(60, "tl".to_string())).unwrap())
}

#[test]
fn test_ticket_prefix_invalidation_is_exact() {
    let cache = store();
    for i in 0..7 {
        cache.set(format!("ticket:{i}"), format!("result {i}"));
    }
    cache.set("view:ticket:1", "other".to_string());
    cache.set("ticket", "no colon".to_string());

    let removed = cache.invalidate_pattern("ticket:*").unwrap();

    assert_eq!(removed, 7);
    let mut remaining = cache.keys();
    remaining.sort();
    assert_eq!(remaining, vec!["ticket".to_string(), "view:ticket:1".to_string()]);
    assert_eq!(cache.stats().invalidations, 7);
}

#[test]
fn test_hit_rate_after_three_hits_and_one_miss() {
    let cache = store();
    cache.set("ticket:1", "positive".to_string());
    for _ in 0..3 {
        assert!(cache.get("ticket:1").is_some());
    }
    assert!(cache.get("ticket:2").is_none());
    assert_eq!(cache.stats().hit_rate(), 0.75);
}

#[tokio::test]
async fn test_expiry_counts_once_across_repeated_lookups() {
    let cache = store();
    cache.set_with_ttl("ticket:1", "neutral".to_string(), Duration::from_millis(1));
    tokio::time::sleep(Duration::from_millis(15)).await;

    for _ in 0..4 {
        assert_eq!(cache.get("ticket:1"), None);
    }
    let stats = cache.stats();
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.misses, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_never_lose_counter_updates() {
    let cache = store();
    let tasks: Vec<_> = (0..16)
        .map(|t| {
            let cache = cache.clone();
            tokio::spawn(async move {
                for i in 0..100 {
                    let key = format!("ticket:{}", (t * 100 + i) % 50);
                    cache.set(key.clone(), "x".to_string());
                    cache.get(&key);
                    cache.get("ticket:missing");
                }
            })
        })
        .collect();
    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.sets, 1600);
    assert_eq!(stats.hits + stats.misses, 3200);
    assert!(stats.misses >= 1600);
    assert_eq!(cache.len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_invalidation_races_with_writers() {
    let cache = store();
    let writers: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    cache.set(format!("ticket:{t}:{i}"), "x".to_string());
                }
            })
        })
        .collect();
    let invalidator = {
        let cache = cache.clone();
        tokio::spawn(async move {
            let mut removed = 0;
            for _ in 0..20 {
                removed += cache.invalidate_pattern("ticket:*").unwrap();
                tokio::task::yield_now().await;
            }
            removed
        })
    };

    for writer in futures::future::join_all(writers).await {
        writer.unwrap();
    }
    let removed = invalidator.await.unwrap();

    // Every write either got invalidated or is still there
    assert_eq!(removed + cache.len(), 800);
    assert_eq!(cache.stats().invalidations as usize, removed);
}

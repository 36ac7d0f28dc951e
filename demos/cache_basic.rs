//! # Basic Caching Example
//!
//! This example uses the TTL cache store on its own:
//! - Per-entry TTLs and lazy expiry
//! - Understanding cache hits vs misses
//! - Glob pattern invalidation
//! - Background sweeping of expired entries

use std::sync::Arc;
use std::time::Duration;
use ticketlens::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("🚀 TicketLens Basic Caching Example");
    println!("===================================");

    let cache_config = CacheConfig::new(
        300,                   // default_ttl_seconds
        "reports".to_string(), // key_prefix
    );
    let cache: Arc<CacheManager<String>> = Arc::new(CacheManager::new(cache_config)?);
    let sweeper = cache.spawn_sweeper(Duration::from_millis(100));

    // 1. Writes
    println!("\n📝 Writing entries");
    println!("------------------");
    for (id, label) in [("1", "positive"), ("2", "negative"), ("3", "neutral")] {
        cache.set(format!("ticket:{id}"), label.to_string());
    }
    cache.set("summary:weekly", "mostly positive".to_string());
    cache.set_with_ttl("ticket:flash", "short lived".to_string(), Duration::from_millis(50));
    println!("✅ {} entries stored", cache.len());

    // 2. Hits and misses
    println!("\n🎯 Hits and misses");
    println!("------------------");
    for key in ["ticket:1", "ticket:2", "ticket:1", "ticket:404"] {
        match cache.get(key) {
            Some(value) => println!("  HIT  {key} = {value}"),
            None => println!("  MISS {key}"),
        }
    }
    if let Some(ttl) = cache.ttl_remaining("ticket:1") {
        println!("  ticket:1 expires in {}s", ttl.as_secs());
    }

    // 3. Expiry
    println!("\n⏳ Expiry");
    println!("---------");
    tokio::time::sleep(Duration::from_millis(250)).await;
    println!(
        "  ticket:flash present after 250ms: {}",
        cache.contains("ticket:flash")
    );

    // 4. Pattern invalidation
    println!("\n🧹 Pattern invalidation");
    println!("-----------------------");
    let removed = cache.invalidate_pattern("ticket:[12]")?;
    println!("  'ticket:[12]' removed {removed}");
    let removed = cache.invalidate_pattern("ticket:*")?;
    println!("  'ticket:*' removed {removed}");
    match cache.invalidate_pattern("ticket:[") {
        Ok(_) => println!("  unexpected success"),
        Err(e) => println!("  rejected: {e}"),
    }
    println!("  remaining keys: {:?}", cache.keys());

    // 5. Statistics
    let stats = cache.stats();
    println!("\n📊 Statistics");
    println!("-------------");
    println!(
        "  hits={} misses={} sets={} expirations={} invalidations={} entries={}",
        stats.hits, stats.misses, stats.sets, stats.expirations, stats.invalidations, stats.entries
    );
    println!("  hit rate: {:.1}%", stats.hit_rate() * 100.0);

    sweeper.abort();
    println!("\n🎉 Caching example completed");
    Ok(())
}

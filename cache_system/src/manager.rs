//! Cache manager implementation
//!
//! This module provides the main CacheManager struct: an in-process TTL
//! store backed by a sharded map, so unrelated keys never wait on one lock.

use crate::entry::CacheEntry;
use crate::errors::CacheError;
use crate::pattern::Pattern;
use crate::stats::{CacheStatistics, CacheStats};
use config::CacheConfig;
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// TTL cache for analysis results
///
/// Share it between callers with `Arc`; every operation takes `&self`.
pub struct CacheManager<V> {
    entries: DashMap<String, CacheEntry<V>>,
    stats: CacheStatistics,
    default_ttl: Duration,
    config: CacheConfig,
}

impl<V> Debug for CacheManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<V: Clone> CacheManager<V> {
    /// Create a new cache manager
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        if config.default_ttl_seconds == 0 {
            return Err(CacheError::InvalidTtl(config.default_ttl_seconds));
        }

        Ok(Self {
            entries: DashMap::new(),
            stats: CacheStatistics::new(),
            default_ttl: config.ttl_duration(),
            config,
        })
    }

    /// Create a cache with a default TTL finer than whole seconds.
    ///
    /// `config()` then reports the TTL rounded up to whole seconds;
    /// [`default_ttl`](Self::default_ttl) is the exact value entries get.
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        let whole_seconds = default_ttl
            .as_secs()
            .saturating_add(u64::from(default_ttl.subsec_nanos() > 0))
            .max(1);
        Self {
            entries: DashMap::new(),
            stats: CacheStatistics::new(),
            default_ttl,
            config: CacheConfig::new(whole_seconds, "ticketlens".to_string()),
        }
    }

    /// Look up a live value. An expired entry is removed on the way out and
    /// counted as one expiration.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.stats.record_hit();
                return Some(entry.value().value().clone());
            }
            Some(_) => true,
            None => false,
        };

        // Re-check under the shard lock: a concurrent set may have refreshed it
        if expired && self.entries.remove_if(key, |_, e| e.is_expired_at(now)).is_some() {
            self.stats.add_expirations(1);
        }

        self.stats.record_miss();
        None
    }

    /// Store a value under the default TTL
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store a value, replacing any previous entry and its expiry window
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(value, ttl));
        self.stats.record_set();
    }

    /// Delete specific key from cache; absent keys are not an error
    pub fn delete(&self, key: &str) -> bool {
        let deleted = self.entries.remove(key).is_some();
        if deleted {
            self.stats.record_delete();
        }
        deleted
    }

    /// Delete multiple keys from cache
    pub fn delete_many<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .filter(|key| self.delete(key.as_ref()))
            .count()
    }

    /// Remove every live key matching `pattern` and return how many went.
    ///
    /// Expired entries that happen to match are purged too but are counted
    /// as expirations, not invalidations, and are not part of the result.
    pub fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let compiled = Pattern::parse(pattern)?;
        if pattern.is_empty() {
            return Ok(0);
        }

        let now = Instant::now();
        let mut invalidated = 0usize;
        let mut expired = 0u64;

        if let Some(key) = compiled.literal_key() {
            if let Some((_, entry)) = self.entries.remove(&key) {
                if entry.is_expired_at(now) {
                    expired += 1;
                } else {
                    invalidated += 1;
                }
            }
        } else {
            self.entries.retain(|key, entry| {
                if !compiled.is_match(key) {
                    return true;
                }
                if entry.is_expired_at(now) {
                    expired += 1;
                } else {
                    invalidated += 1;
                }
                false
            });
        }

        self.stats.add_expirations(expired);
        self.stats.add_invalidations(invalidated as u64);
        debug!(pattern, invalidated, expired, "cache pattern invalidated");
        Ok(invalidated)
    }

    /// Check if a live entry exists, without touching hit/miss counters
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Get remaining TTL for a live entry
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .and_then(|entry| entry.remaining_at(now))
    }

    /// Keys of all live entries, in no particular order
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of entries physically held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Live entries count as invalidations.
    pub fn clear(&self) -> usize {
        let now = Instant::now();
        let mut invalidated = 0usize;
        let mut expired = 0u64;
        self.entries.retain(|_, entry| {
            if entry.is_expired_at(now) {
                expired += 1;
            } else {
                invalidated += 1;
            }
            false
        });
        self.stats.add_expirations(expired);
        self.stats.add_invalidations(invalidated as u64);
        invalidated
    }

    /// Physically remove expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0usize;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        self.stats.add_expirations(purged as u64);
        purged
    }

    /// Snapshot of the statistics counters
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get current configuration. `default_ttl_seconds` is whole seconds;
    /// use [`default_ttl`](Self::default_ttl) for the exact TTL.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<V: Clone + Send + Sync + 'static> CacheManager<V> {
    /// Periodically purge expired entries until the cache is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick resolves immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    debug!("cache dropped, sweeper exiting");
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!(purged, "expired cache entries swept");
                }
            }
        })
    }
}

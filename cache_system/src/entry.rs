//! Cache entry with its expiration window

use std::time::{Duration, Instant};

/// A stored value together with the instant it stops being visible
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    ttl: Duration,
    created_at: Instant,
    /// `None` when `created_at + ttl` does not fit in an `Instant`
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        let created_at = Instant::now();
        Self {
            value,
            ttl,
            created_at,
            expires_at: created_at.checked_add(ttl),
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Time left before expiry, `None` once expired
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        match self.expires_at {
            Some(at) if now >= at => None,
            Some(at) => Some(at - now),
            None => Some(Duration::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_window() {
        let entry = CacheEntry::new("positive", Duration::from_secs(10));
        let now = entry.created_at();
        assert!(!entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now + Duration::from_secs(9)));
        assert!(entry.is_expired_at(now + Duration::from_secs(10)));
        assert_eq!(entry.remaining_at(now), Some(Duration::from_secs(10)));
        assert_eq!(entry.remaining_at(now + Duration::from_secs(11)), None);
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new(1u8, Duration::ZERO);
        assert!(entry.is_expired_at(entry.created_at()));
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let entry = CacheEntry::new(1u8, Duration::MAX);
        assert_eq!(entry.expires_at(), None);
        assert!(!entry.is_expired_at(Instant::now()));
    }
}

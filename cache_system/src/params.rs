//! Cache parameter configuration
//!
//! This module defines the CacheParams struct which pairs a shared cache
//! with the TTL and key layout one consumer writes under.

use crate::pattern::escape;
use crate::CacheManager;
use std::sync::Arc;
use std::time::Duration;

/// Cache parameters for configuring cache behavior per consumer
#[derive(Debug, Clone)]
pub struct CacheParams<V> {
    /// The cache manager instance
    pub manager: Arc<CacheManager<V>>,
    /// TTL for entries written through these params
    pub ttl: Duration,
    /// Prefix for cache keys
    pub prefix: String,
}

impl<V: Clone> CacheParams<V> {
    pub fn new(manager: Arc<CacheManager<V>>, ttl: Duration, prefix: &str) -> Self {
        Self {
            ttl,
            prefix: prefix.to_string(),
            manager,
        }
    }

    /// Params that follow the manager's own default TTL and key prefix
    pub fn from_manager(manager: Arc<CacheManager<V>>) -> Self {
        let ttl = manager.default_ttl();
        let prefix = manager.config().key_prefix.clone();
        Self::new(manager, ttl, &prefix)
    }

    /// Generate cache key for one ticket analysed by one model.
    ///
    /// `:` and `%` inside the model and the id are percent-encoded, so the
    /// last two `:`-separated segments are always `ticket` and the id.
    pub fn build_ticket_key(&self, model: &str, ticket_id: &str) -> String {
        format!(
            "{}:{}:ticket:{}",
            self.prefix,
            encode_segment(model),
            encode_segment(ticket_id)
        )
    }

    /// Pattern covering every cached analysis produced by `model`
    pub fn model_pattern(&self, model: &str) -> String {
        format!(
            "{}:{}:ticket:*",
            escape(&self.prefix),
            escape(&encode_segment(model))
        )
    }

    /// Pattern covering every cached analysis of one ticket, across models
    pub fn ticket_pattern(&self, ticket_id: &str) -> String {
        format!(
            "{}:*:ticket:{}",
            escape(&self.prefix),
            escape(&encode_segment(ticket_id))
        )
    }
}

fn encode_segment(segment: &str) -> String {
    if !segment.contains([':', '%']) {
        return segment.to_string();
    }
    let mut encoded = String::with_capacity(segment.len() + 4);
    for c in segment.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            ':' => encoded.push_str("%3A"),
            c => encoded.push(c),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::CacheConfig;

    #[test]
    fn test_key_layout_and_patterns() {
        let manager = Arc::new(CacheManager::<u8>::new(CacheConfig::default()).unwrap());
        let params = CacheParams::from_manager(manager.clone());
        assert_eq!(params.ttl, Duration::from_secs(3600));

        let key = params.build_ticket_key("gpt-4o", "T-1");
        assert_eq!(key, "ticketlens:gpt-4o:ticket:T-1");

        manager.set(key, 1);
        manager.set(params.build_ticket_key("claude", "T-1"), 2);
        manager.set(params.build_ticket_key("claude", "T-2"), 3);

        assert_eq!(manager.invalidate_pattern(&params.ticket_pattern("T-1")).unwrap(), 2);
        assert_eq!(manager.invalidate_pattern(&params.model_pattern("claude")).unwrap(), 1);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_ticket_pattern_escapes_ids() {
        let manager = Arc::new(CacheManager::<u8>::new(CacheConfig::default()).unwrap());
        let params = CacheParams::from_manager(manager.clone());
        manager.set(params.build_ticket_key("m", "a*"), 1);
        manager.set(params.build_ticket_key("m", "ab"), 2);
        assert_eq!(manager.invalidate_pattern(&params.ticket_pattern("a*")).unwrap(), 1);
        assert!(manager.contains(&params.build_ticket_key("m", "ab")));
    }

    #[test]
    fn test_ticket_pattern_does_not_cross_segments() {
        let manager = Arc::new(CacheManager::<u8>::new(CacheConfig::default()).unwrap());
        let params = CacheParams::from_manager(manager.clone());
        let plain = params.build_ticket_key("m", "x");
        let nested = params.build_ticket_key("m", "y:ticket:x");
        assert_eq!(nested, "ticketlens:m:ticket:y%3Aticket%3Ax");
        manager.set(plain.clone(), 1);
        manager.set(nested.clone(), 2);

        assert_eq!(manager.invalidate_pattern(&params.ticket_pattern("x")).unwrap(), 1);
        assert!(!manager.contains(&plain));
        assert!(manager.contains(&nested));
        assert_eq!(manager.invalidate_pattern(&params.ticket_pattern("y:ticket:x")).unwrap(), 1);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_model_segment_is_encoded() {
        let manager = Arc::new(CacheManager::<u8>::new(CacheConfig::default()).unwrap());
        let params = CacheParams::from_manager(manager.clone());
        manager.set(params.build_ticket_key("vendor:model", "T-1"), 1);
        manager.set(params.build_ticket_key("vendor", "model:ticket:T-1"), 2);
        manager.set(params.build_ticket_key("100%", "T-1"), 3);

        assert_eq!(manager.invalidate_pattern(&params.model_pattern("vendor:model")).unwrap(), 1);
        assert_eq!(manager.invalidate_pattern(&params.model_pattern("vendor")).unwrap(), 1);
        assert_eq!(manager.invalidate_pattern(&params.ticket_pattern("T-1")).unwrap(), 1);
        assert!(manager.is_empty());
    }
}

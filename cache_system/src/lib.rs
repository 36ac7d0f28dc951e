//! Cache system for analysis results
//!
//! This crate provides an in-process TTL cache with glob-based
//! invalidation and live statistics.

pub mod entry;
pub mod errors;
pub mod manager;
pub mod params;
pub mod pattern;
pub mod prelude;
pub mod stats;

// Re-export centralized config
pub use config::CacheConfig;

pub use entry::CacheEntry;
pub use errors::CacheError;
pub use manager::CacheManager;
pub use params::CacheParams;
pub use pattern::{matches, Pattern};
pub use stats::{CacheStatistics, CacheStats};

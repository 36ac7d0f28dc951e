//! Error types for cache operations
//!
//! This module defines all error types that can occur
//! while building or mutating the analysis cache.

use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid TTL value: {0}")]
    InvalidTtl(u64),
}

impl CacheError {
    pub(crate) fn invalid_pattern(pattern: &str, reason: &str) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

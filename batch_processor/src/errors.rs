use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of the whole `process_batch` call, raised before any work starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failure of a single batch item. Never escalated to the batch call.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("Analysis gateway error: {0}")]
    Gateway(String),

    #[error("Rate limited by analysis provider (retry after {retry_after_ms:?} ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Malformed analysis response: {0}")]
    MalformedResponse(String),

    #[error("Analysis timed out after {0} ms")]
    Timeout(u64),

    #[error("Ticket payload unavailable: {0}")]
    PayloadUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn timeout(limit: std::time::Duration) -> Self {
        Self::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
    }

    /// Whether a caller-side retry could reasonably succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Gateway(_) | Self::RateLimited { .. } | Self::Timeout(_)
        )
    }
}

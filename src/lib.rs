//! # TicketLens
//!
//! Caching and concurrent batch-analysis core for support-ticket sentiment
//! analysis: a TTL cache with glob invalidation and live statistics, feeding
//! a bounded-concurrency batch processor that calls a pluggable AI gateway.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ticketlens::prelude::*;
//! use std::sync::Arc;
//!
//! struct KeywordGateway;
//!
//! #[async_trait]
//! impl AnalysisGateway for KeywordGateway {
//!     async fn analyze(&self, payload: TicketPayload) -> Result<AnalysisResult, AnalysisError> {
//!         let sentiment = if payload.body.contains("broken") {
//!             Sentiment::Negative
//!         } else {
//!             Sentiment::Neutral
//!         };
//!         Ok(AnalysisResult::new(payload.ticket_id, sentiment, 0.0, 0.6, "keyword-v1"))
//!     }
//!
//!     fn model(&self) -> &str {
//!         "keyword-v1"
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lens = TicketLens::new(
//!         AppConfig::default(),
//!         Arc::new(KeywordGateway),
//!         Arc::new(IdOnlyPayloads),
//!     )?;
//!
//!     let batch = lens.analyze_tickets(&["T-1", "T-2", "T-1"]).await?;
//!     println!(
//!         "cached={} succeeded={} failed={}",
//!         batch.cached_count, batch.succeeded_count, batch.failed_count
//!     );
//!
//!     lens.invalidate_ticket("T-1")?;
//!     println!("hit rate: {:.2}", lens.stats().hit_rate());
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::TicketLens;
pub use crate::errors::TicketLensError;

// Re-export centralized config
pub use config::{AppConfig, BatchConfig, CacheConfig, SignalConfig};

// Re-export internal crates used by the public API
pub use batch_processor;
pub use cache_system;
pub use signal_system;

// Re-export external dependencies used in public API
pub use async_trait;

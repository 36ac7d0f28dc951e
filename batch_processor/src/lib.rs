//! Batch processor for ticket sentiment analysis
//!
//! Consults the analysis cache for every ticket in a batch, sends the misses
//! to a pluggable [`AnalysisGateway`] under a concurrency ceiling, writes
//! successes back with a TTL and reports one outcome per input position.

pub mod options;
pub mod core;
pub mod errors;
pub mod gateway;
pub mod types;

// Re-export the main public types for convenience
pub use crate::options::BatchOptions;
pub use crate::core::BatchProcessor;
pub use errors::{AnalysisError, BatchError};
pub use gateway::{AnalysisGateway, GatewayFn, IdOnlyPayloads, PayloadSupplier, StaticPayloads};
pub use types::{
    AnalysisResult, BatchItem, BatchResult, ItemStatus, Sentiment, TicketPayload,
};

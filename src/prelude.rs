//! Convenience re-exports for common TicketLens usage
//!
//! This prelude module re-exports the most commonly used items from the TicketLens workspace,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use ticketlens::prelude::*;
//!
//! let options = BatchOptions::new(4, std::time::Duration::from_secs(60));
//! assert!(options.validate().is_ok());
//! ```

// Core TicketLens components
pub use crate::core::TicketLens;
pub use crate::errors::TicketLensError;

// Re-export centralized config
pub use config::{AppConfig, BatchConfig, CacheConfig, ConfigError, SignalConfig};

// Batch processing
pub use batch_processor::{
    AnalysisError, AnalysisGateway, AnalysisResult, BatchError, BatchItem, BatchOptions,
    BatchProcessor, BatchResult, GatewayFn, IdOnlyPayloads, ItemStatus, PayloadSupplier,
    Sentiment, StaticPayloads, TicketPayload,
};

// Re-export cache system
pub use cache_system::prelude::*;

// Re-export signal system for event handling
pub use signal_system::prelude::*;

// Common external dependencies
pub use anyhow;
pub use serde::{Deserialize, Serialize};
pub use async_trait::async_trait;
pub use serde_json;
pub use tokio;

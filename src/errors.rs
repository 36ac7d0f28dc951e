//! Error types for the TicketLens crate
//!
//! This module contains all error types that can be returned by TicketLens operations.

use batch_processor::BatchError;
use cache_system::CacheError;
use config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TicketLensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),
}

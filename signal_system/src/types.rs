//! Type definitions for signal system

use crate::event::AnalysisEvent;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Event callback type
pub type EventCallback = Arc<dyn Fn(&AnalysisEvent) + Send + Sync>;

/// Handle returned on registration, used to remove the callback again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CallbackId(pub u64);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Callback limit reached: {0}")]
    TooManyCallbacks(usize),
}

/// Delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalStats {
    pub emitted: u64,
    pub delivered: u64,
    pub callback_panics: u64,
}

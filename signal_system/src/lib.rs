//! Signal system for analysis event handling
//!
//! This crate lets reporting and CLI layers observe batch progress and
//! cache invalidations without the core depending on them.

pub mod event;
pub mod manager;
pub mod prelude;
pub mod types;

// Re-export centralized config
pub use config::SignalConfig;

pub use event::{AnalysisEvent, EventType};
pub use manager::SignalManager;
pub use types::{CallbackId, EventCallback, SignalError, SignalStats};

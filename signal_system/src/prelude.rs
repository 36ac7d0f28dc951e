//! Convenience re-exports for common signal-system usage

// Core signal system components
pub use crate::event::{AnalysisEvent, EventType};
pub use crate::manager::SignalManager;
pub use crate::types::{CallbackId, EventCallback, SignalError, SignalStats};

// Re-export centralized config
pub use config::SignalConfig;

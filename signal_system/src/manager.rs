use crate::event::AnalysisEvent;
use crate::types::{CallbackId, EventCallback, SignalError, SignalStats};
use config::SignalConfig;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// Signal manager for analysis event notifications
pub struct SignalManager {
    callbacks: RwLock<Vec<(CallbackId, EventCallback)>>,
    config: SignalConfig,
    next_id: AtomicU64,
    emitted: AtomicU64,
    delivered: AtomicU64,
    callback_panics: AtomicU64,
}

impl std::fmt::Debug for SignalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("enabled", &self.config.enabled)
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl SignalManager {
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    pub fn with_config(config: SignalConfig) -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
            config,
            next_id: AtomicU64::new(1),
            emitted: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            callback_panics: AtomicU64::new(0),
        }
    }

    /// Add event callback
    pub fn add_callback<F>(&self, callback: F) -> Result<CallbackId, SignalError>
    where
        F: Fn(&AnalysisEvent) + Send + Sync + 'static,
    {
        let mut callbacks = self.write_callbacks();
        if callbacks.len() >= self.config.max_callbacks {
            return Err(SignalError::TooManyCallbacks(self.config.max_callbacks));
        }

        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        callbacks.push((id, Arc::new(callback)));
        Ok(id)
    }

    /// Remove a previously registered callback
    pub fn remove_callback(&self, id: CallbackId) -> bool {
        let mut callbacks = self.write_callbacks();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Emit event to all subscribers
    ///
    /// Callbacks run on the emitting thread. A panicking callback is logged
    /// and skipped; the remaining callbacks still receive the event.
    pub fn emit(&self, event: AnalysisEvent) {
        if !self.config.enabled {
            return;
        }
        self.emitted.fetch_add(1, Ordering::Relaxed);

        // Clone the list so callbacks may register or remove callbacks themselves
        let callbacks: Vec<EventCallback> = self
            .read_callbacks()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();

        for callback in callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(&event))) {
                Ok(()) => {
                    self.delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    self.callback_panics.fetch_add(1, Ordering::Relaxed);
                    warn!(event_type = ?event.event_type, "signal callback panicked");
                }
            }
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        self.write_callbacks().clear();
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.read_callbacks().len()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn stats(&self) -> SignalStats {
        SignalStats {
            emitted: self.emitted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            callback_panics: self.callback_panics.load(Ordering::Relaxed),
        }
    }

    // Poisoning is ignored: every update to the list is a single push, retain or clear
    fn read_callbacks(&self) -> RwLockReadGuard<'_, Vec<(CallbackId, EventCallback)>> {
        self.callbacks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_callbacks(&self) -> RwLockWriteGuard<'_, Vec<(CallbackId, EventCallback)>> {
        self.callbacks.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}

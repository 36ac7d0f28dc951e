//! Core TicketLens functionality
//!
//! This module contains the main TicketLens struct and its implementation,
//! providing centralized coordination for the analysis cache, the batch
//! processor and signals.

use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::errors::TicketLensError;
use batch_processor::{
    AnalysisGateway, AnalysisResult, BatchOptions, BatchProcessor, BatchResult, PayloadSupplier,
};
use cache_system::{CacheManager, CacheStats};
use config::AppConfig;
use signal_system::{AnalysisEvent, EventType, SignalManager};

/// Main TicketLens coordinator owning the shared cache and the processor
/// that feeds it
pub struct TicketLens {
    config: AppConfig,
    cache: Arc<CacheManager<AnalysisResult>>,
    signals: Arc<SignalManager>,
    processor: BatchProcessor,
    sweeper: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for TicketLens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketLens")
            .field("config", &self.config)
            .field("processor", &self.processor)
            .field("sweeper_running", &self.sweeper.is_some())
            .finish()
    }
}

impl TicketLens {
    /// Create new TicketLens from an already loaded configuration
    pub fn new(
        config: AppConfig,
        gateway: Arc<dyn AnalysisGateway>,
        payloads: Arc<dyn PayloadSupplier>,
    ) -> Result<Self, TicketLensError> {
        config.validate()?;

        let cache = Arc::new(CacheManager::new(config.cache.clone())?);
        let signals = Arc::new(SignalManager::with_config(config.signal.clone()));
        let mut processor = BatchProcessor::new(cache.clone(), gateway, payloads);
        processor.set_signal_manager(signals.clone());

        crate::debug_log!(
            model = processor.model(),
            prefix = %config.cache.key_prefix,
            "ticketlens initialised"
        );

        Ok(Self {
            config,
            cache,
            signals,
            processor,
            sweeper: None,
        })
    }

    /// Create TicketLens from `TICKETLENS_CONFIG` or `./ticketlens.toml`
    pub fn load(
        gateway: Arc<dyn AnalysisGateway>,
        payloads: Arc<dyn PayloadSupplier>,
    ) -> Result<Self, TicketLensError> {
        Self::new(AppConfig::load()?, gateway, payloads)
    }

    /// Create TicketLens from a TOML file
    pub fn from_config_file<P: AsRef<Path>>(
        path: P,
        gateway: Arc<dyn AnalysisGateway>,
        payloads: Arc<dyn PayloadSupplier>,
    ) -> Result<Self, TicketLensError> {
        Self::new(AppConfig::from_file(path)?, gateway, payloads)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared analysis cache, usable directly by reporting layers
    pub fn cache(&self) -> &Arc<CacheManager<AnalysisResult>> {
        &self.cache
    }

    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signals
    }

    pub fn processor(&self) -> &BatchProcessor {
        &self.processor
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Batch options derived from the `[batch]` and `[cache]` sections
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions::from_config(&self.config.batch, self.config.cache.ttl_duration())
    }

    /// Analyze tickets using the configured concurrency, TTL and timeouts
    pub async fn analyze_tickets<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<BatchResult, TicketLensError> {
        let options = self.batch_options();
        Ok(self.processor.process_batch_with(ids, &options).await?)
    }

    /// Drop every cached analysis whose key matches `pattern`
    pub fn invalidate_tickets(&self, pattern: &str) -> Result<usize, TicketLensError> {
        let removed = self.cache.invalidate_pattern(pattern)?;
        crate::debug_log!(pattern, removed, "cached analyses invalidated");
        self.signals.emit(
            AnalysisEvent::new(EventType::CacheInvalidated)
                .with_payload("pattern", pattern)
                .with_payload("removed", removed),
        );
        Ok(removed)
    }

    /// Drop the cached analyses of one ticket, whatever model produced them
    pub fn invalidate_ticket(&self, ticket_id: &str) -> Result<usize, TicketLensError> {
        let pattern = self.processor.cache_params().ticket_pattern(ticket_id);
        self.invalidate_tickets(&pattern)
    }

    /// Drop every analysis cached for the current gateway model
    pub fn invalidate_model(&self) -> Result<usize, TicketLensError> {
        let pattern = self
            .processor
            .cache_params()
            .model_pattern(self.processor.model());
        self.invalidate_tickets(&pattern)
    }

    /// Start the background expiration sweep if one is configured.
    ///
    /// Must be called from within a tokio runtime. Returns whether a sweeper
    /// is running afterwards.
    pub fn start_sweeper(&mut self) -> bool {
        if self.sweeper.is_some() {
            return true;
        }
        match self.config.cache.sweep_interval() {
            Some(interval) => {
                crate::trace_log!(?interval, "starting cache sweeper");
                self.sweeper = Some(self.cache.spawn_sweeper(interval));
                true
            }
            None => false,
        }
    }

    pub fn stop_sweeper(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}

impl Drop for TicketLens {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

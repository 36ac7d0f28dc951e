use cache_system::{CacheManager, CacheParams};
use chrono::Utc;
use signal_system::{AnalysisEvent, EventType, SignalManager};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{AnalysisError, BatchError};
use crate::gateway::{AnalysisGateway, PayloadSupplier};
use crate::options::BatchOptions;
use crate::types::{AnalysisResult, BatchItem, BatchResult, ItemStatus};

/// Runs batches of ticket analyses against the cache and the analysis gateway
///
/// A batch runs on at most `concurrency_limit` worker tasks, each pulling
/// the next group of same-key positions from a shared cursor. Cache
/// visibility inside one batch is live: every lookup reads the store at the
/// moment it runs. Occurrences of the same ticket are evaluated one after
/// another in input order, so a repeated id observes the write made by its
/// earlier occurrence. Distinct tickets run concurrently.
#[derive(Clone)]
pub struct BatchProcessor {
    cache: CacheParams<AnalysisResult>,
    gateway: Arc<dyn AnalysisGateway>,
    payloads: Arc<dyn PayloadSupplier>,
    signal_manager: Option<Arc<SignalManager>>,
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("model", &self.gateway.model())
            .field("cache_prefix", &self.cache.prefix)
            .field("has_signals", &self.has_signals())
            .finish()
    }
}

impl BatchProcessor {
    /// Create a processor writing under the cache's own prefix and default TTL
    pub fn new(
        cache: Arc<CacheManager<AnalysisResult>>,
        gateway: Arc<dyn AnalysisGateway>,
        payloads: Arc<dyn PayloadSupplier>,
    ) -> Self {
        Self::with_cache_params(CacheParams::from_manager(cache), gateway, payloads)
    }

    pub fn with_cache_params(
        cache: CacheParams<AnalysisResult>,
        gateway: Arc<dyn AnalysisGateway>,
        payloads: Arc<dyn PayloadSupplier>,
    ) -> Self {
        Self {
            cache,
            gateway,
            payloads,
            signal_manager: None,
        }
    }

    /// Set signal manager for this processor
    pub fn set_signal_manager(&mut self, signal_manager: Arc<SignalManager>) {
        self.signal_manager = Some(signal_manager);
    }

    /// Remove signal manager from this processor
    pub fn remove_signal_manager(&mut self) {
        self.signal_manager = None;
    }

    /// Check if signal manager is set
    pub fn has_signals(&self) -> bool {
        self.signal_manager.is_some()
    }

    pub fn cache(&self) -> &Arc<CacheManager<AnalysisResult>> {
        &self.cache.manager
    }

    pub fn cache_params(&self) -> &CacheParams<AnalysisResult> {
        &self.cache
    }

    pub fn model(&self) -> &str {
        self.gateway.model()
    }

    /// Cache key under which the analysis of `ticket_id` is stored
    pub fn cache_key(&self, ticket_id: &str) -> String {
        self.cache.build_ticket_key(self.gateway.model(), ticket_id)
    }

    /// Analyze `ids`, with at most `concurrency_limit` gateway calls in flight
    pub async fn process_batch<S: AsRef<str>>(
        &self,
        ids: &[S],
        concurrency_limit: usize,
        ttl: Duration,
    ) -> Result<BatchResult, BatchError> {
        self.process_batch_with(ids, &BatchOptions::new(concurrency_limit, ttl))
            .await
    }

    /// Analyze `ids` with explicit options.
    ///
    /// Fails only when `options` are invalid, before any cache lookup or
    /// gateway call. Per-item failures are reported in the returned items.
    pub async fn process_batch_with<S: AsRef<str>>(
        &self,
        ids: &[S],
        options: &BatchOptions,
    ) -> Result<BatchResult, BatchError> {
        options.validate()?;

        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        debug!(
            %batch_id,
            items = ids.len(),
            concurrency_limit = options.concurrency_limit,
            model = self.gateway.model(),
            "starting analysis batch"
        );
        self.emit_signal(
            AnalysisEvent::new(EventType::BatchStarted)
                .with_batch_id(batch_id)
                .with_payload("items", ids.len())
                .with_payload("model", self.gateway.model()),
        );

        let mut slots: Vec<BatchItem> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| BatchItem::pending(index, id.as_ref()))
            .collect();

        let groups: Arc<[KeyGroup]> = self.group_by_cache_key(ids).into();
        let worker = Arc::new(ItemWorker {
            cache: self.cache.manager.clone(),
            gateway: self.gateway.clone(),
            payloads: self.payloads.clone(),
            ttl: options.ttl,
            item_timeout: options.item_timeout,
        });
        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel::<BatchItem>();
        let mut workers = JoinSet::new();

        for _ in 0..options.concurrency_limit.min(groups.len()) {
            let worker = worker.clone();
            let groups = groups.clone();
            let cursor = cursor.clone();
            let tx = tx.clone();
            workers.spawn(async move {
                loop {
                    let next = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some((key, members)) = groups.get(next) else {
                        break;
                    };
                    for (index, id) in members {
                        let item = worker.evaluate_guarded(key, *index, id).await;
                        if tx.send(item).is_err() {
                            return;
                        }
                    }
                }
            });
        }
        drop(tx);

        let collect = async {
            while let Some(item) = rx.recv().await {
                self.emit_item(batch_id, &item);
                let index = item.index();
                slots[index] = item;
            }
        };
        let timed_out = match options.batch_timeout {
            Some(limit) => tokio::time::timeout(limit, collect).await.is_err(),
            None => {
                collect.await;
                false
            }
        };

        if timed_out {
            warn!(%batch_id, "batch deadline reached, cancelling outstanding analyses");
            workers.abort_all();
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    warn!(%batch_id, "analysis worker panicked");
                }
            }
        }
        // Items finished right before the deadline may still sit in the channel
        while let Ok(item) = rx.try_recv() {
            self.emit_item(batch_id, &item);
            let index = item.index();
            slots[index] = item;
        }

        let unfinished_error = match options.batch_timeout {
            Some(limit) if timed_out => AnalysisError::timeout(limit),
            _ => AnalysisError::Internal(
                "analysis worker stopped before finishing the item".to_string(),
            ),
        };
        let items: Vec<BatchItem> = slots
            .into_iter()
            .map(|item| {
                if item.status() == ItemStatus::Pending {
                    let failed = item.fail_pending(unfinished_error.clone());
                    self.emit_item(batch_id, &failed);
                    failed
                } else {
                    item
                }
            })
            .collect();

        let result = BatchResult::new(batch_id, items, started_at);
        debug!(
            %batch_id,
            cached = result.cached_count,
            succeeded = result.succeeded_count,
            failed = result.failed_count,
            "analysis batch finished"
        );
        self.emit_signal(
            AnalysisEvent::new(EventType::BatchFinished)
                .with_batch_id(batch_id)
                .with_payload("cached", result.cached_count)
                .with_payload("succeeded", result.succeeded_count)
                .with_payload("failed", result.failed_count),
        );

        Ok(result)
    }

    /// Positions grouped by cache key, groups in order of first appearance
    fn group_by_cache_key<S: AsRef<str>>(&self, ids: &[S]) -> Vec<KeyGroup> {
        let mut groups: Vec<KeyGroup> = Vec::new();
        let mut by_key: HashMap<String, usize> = HashMap::new();

        for (index, id) in ids.iter().enumerate() {
            let id = id.as_ref();
            let key = self.cache_key(id);
            match by_key.get(&key) {
                Some(&group) => groups[group].1.push((index, id.to_string())),
                None => {
                    by_key.insert(key.clone(), groups.len());
                    groups.push((key, vec![(index, id.to_string())]));
                }
            }
        }
        groups
    }

    fn emit_item(&self, batch_id: Uuid, item: &BatchItem) {
        if self.signal_manager.is_none() {
            return;
        }
        let event_type = match item.status() {
            ItemStatus::Cached => EventType::ItemCached,
            ItemStatus::Succeeded => EventType::ItemSucceeded,
            ItemStatus::Failed => EventType::ItemFailed,
            ItemStatus::Pending => return,
        };
        let mut event = AnalysisEvent::new(event_type)
            .with_batch_id(batch_id)
            .with_ticket(item.index(), item.id());
        if let Some(error) = item.error() {
            event.add_payload("error", error.to_string());
        }
        self.emit_signal(event);
    }

    fn emit_signal(&self, event: AnalysisEvent) {
        if let Some(signal_manager) = &self.signal_manager {
            signal_manager.emit(event);
        }
    }
}

/// One cache key with the input positions and ids that map to it
type KeyGroup = (String, Vec<(usize, String)>);

/// Shared state of the worker tasks of one batch
struct ItemWorker {
    cache: Arc<CacheManager<AnalysisResult>>,
    gateway: Arc<dyn AnalysisGateway>,
    payloads: Arc<dyn PayloadSupplier>,
    ttl: Duration,
    item_timeout: Option<Duration>,
}

impl ItemWorker {
    /// Evaluate one position; a panic in the gateway or supplier fails only
    /// this item and leaves the worker running
    async fn evaluate_guarded(&self, key: &str, index: usize, id: &str) -> BatchItem {
        match AssertUnwindSafe(self.evaluate(key, index, id.to_string()))
            .catch_unwind()
            .await
        {
            Ok(item) => item,
            Err(_) => {
                warn!(ticket_id = %id, "ticket analysis panicked");
                BatchItem::failed(
                    index,
                    id,
                    AnalysisError::Internal("ticket analysis panicked".to_string()),
                )
            }
        }
    }

    async fn evaluate(&self, key: &str, index: usize, id: String) -> BatchItem {
        if let Some(result) = self.cache.get(key) {
            return BatchItem::cached(index, id, result);
        }

        let payload = match self.payloads.payload(&id) {
            Ok(payload) => payload,
            Err(error) => {
                debug!(ticket_id = %id, %error, "ticket payload unavailable");
                return BatchItem::failed(index, id, error);
            }
        };

        let outcome = match self.item_timeout {
            Some(limit) => tokio::time::timeout(limit, self.gateway.analyze(payload))
                .await
                .unwrap_or_else(|_| Err(AnalysisError::timeout(limit))),
            None => self.gateway.analyze(payload).await,
        };

        match outcome {
            Ok(result) => {
                self.cache.set_with_ttl(key, result.clone(), self.ttl);
                BatchItem::succeeded(index, id, result)
            }
            Err(error) => {
                debug!(ticket_id = %id, %error, "ticket analysis failed");
                BatchItem::failed(index, id, error)
            }
        }
    }
}

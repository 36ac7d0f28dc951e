//! Integration tests for batch analysis through the TicketLens facade
//!
//! Covers the shared-cache behaviour across concurrent batches, the
//! configured defaults, and invalidation events.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticketlens::prelude::*;

const MODEL: &str = "sentiment-v2";

/// Gateway double: fails for configured ids, counts calls
#[derive(Default)]
struct CountingGateway {
    failing: HashSet<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingGateway {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisGateway for CountingGateway {
    async fn analyze(&self, payload: TicketPayload) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.failing.contains(&payload.ticket_id) {
            return Err(AnalysisError::RateLimited {
                retry_after_ms: Some(1000),
            });
        }
        let sentiment = if payload.body.contains("angry") {
            Sentiment::Negative
        } else {
            Sentiment::Positive
        };
        Ok(AnalysisResult::new(payload.ticket_id, sentiment, 0.5, 0.8, MODEL)
            .with_summary(payload.subject))
    }

    fn model(&self) -> &str {
        MODEL
    }
}

fn payloads() -> Arc<StaticPayloads> {
    Arc::new(
        (0..100)
            .map(|i| {
                let body = if i % 2 == 0 { "angry customer" } else { "thanks!" };
                TicketPayload::new(format!("T-{i}"), format!("Ticket {i}"), body)
            })
            .collect(),
    )
}

fn lens(gateway: Arc<CountingGateway>) -> TicketLens {
    let mut config = AppConfig::default();
    config.batch = BatchConfig::new(3);
    TicketLens::new(config, gateway, payloads()).expect("default config is valid")
}

#[tokio::test]
async fn test_mixed_outcomes_through_facade() {
    let gateway = Arc::new(CountingGateway {
        failing: HashSet::from(["T-3".to_string()]),
        ..Default::default()
    });
    let lens = lens(gateway.clone());
    let processor = lens.processor();
    lens.cache().set(
        processor.cache_key("T-1"),
        AnalysisResult::new("T-1", Sentiment::Mixed, 0.1, 0.4, MODEL),
    );

    let batch = lens.analyze_tickets(&["T-1", "T-2", "T-3"]).await.unwrap();

    assert_eq!(
        batch.statuses(),
        vec![ItemStatus::Cached, ItemStatus::Succeeded, ItemStatus::Failed]
    );
    assert_eq!(
        (batch.cached_count, batch.succeeded_count, batch.failed_count),
        (1, 1, 1)
    );
    assert_eq!(batch.items[0].result().unwrap().sentiment, Sentiment::Mixed);
    assert_eq!(batch.items[1].result().unwrap().sentiment, Sentiment::Negative);
    assert!(batch.items[2].error().unwrap().is_transient());
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let gateway = Arc::new(CountingGateway::default());
    let lens = lens(gateway.clone());
    let ids: Vec<String> = (0..10).map(|i| format!("T-{i}")).collect();

    let first = lens.analyze_tickets(&ids).await.unwrap();
    let second = lens.analyze_tickets(&ids).await.unwrap();

    assert_eq!(first.succeeded_count, 10);
    assert_eq!(second.cached_count, 10);
    assert_eq!(gateway.calls(), 10);

    let stats = lens.stats();
    assert_eq!(stats.misses, 10);
    assert_eq!(stats.hits, 10);
    assert_eq!(stats.sets, 10);
    assert_eq!(stats.hit_rate(), 0.5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_batches_keep_exact_counters() {
    let gateway = Arc::new(CountingGateway::with_delay(Duration::from_millis(5)));
    let lens = Arc::new(lens(gateway.clone()));

    // Eight batches of ten distinct ids each, no overlap
    let handles: Vec<_> = (0..8)
        .map(|b| {
            let lens = lens.clone();
            tokio::spawn(async move {
                let ids: Vec<String> = (0..10).map(|i| format!("T-{}", b * 10 + i)).collect();
                lens.analyze_tickets(&ids).await.unwrap()
            })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        let batch = result.unwrap();
        assert_eq!(batch.succeeded_count, 10);
    }

    let stats = lens.stats();
    assert_eq!(stats.misses, 80);
    assert_eq!(stats.sets, 80);
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.entries, 80);
    assert_eq!(gateway.calls(), 80);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_concurrent_batches_stay_consistent() {
    let gateway = Arc::new(CountingGateway::with_delay(Duration::from_millis(2)));
    let lens = Arc::new(lens(gateway.clone()));

    // Every batch asks for the same twenty tickets
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let lens = lens.clone();
            tokio::spawn(async move {
                let ids: Vec<String> = (0..20).map(|i| format!("T-{i}")).collect();
                lens.analyze_tickets(&ids).await.unwrap()
            })
        })
        .collect();

    let mut cached = 0;
    let mut succeeded = 0;
    for result in futures::future::join_all(handles).await {
        let batch = result.unwrap();
        assert_eq!(batch.failed_count, 0);
        cached += batch.cached_count;
        succeeded += batch.succeeded_count;
    }

    let stats = lens.stats();
    assert_eq!(stats.hits + stats.misses, 120);
    assert_eq!(stats.hits as usize, cached);
    assert_eq!(stats.misses as usize, succeeded);
    assert_eq!(stats.sets as usize, gateway.calls());
    assert_eq!(stats.entries, 20);
}

#[tokio::test]
async fn test_invalidation_emits_event_and_forces_reanalysis() {
    let gateway = Arc::new(CountingGateway::default());
    let lens = lens(gateway.clone());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    lens.signals()
        .add_callback(move |event| {
            if event.event_type == EventType::CacheInvalidated {
                sink.lock().unwrap().push(event.clone());
            }
        })
        .unwrap();

    lens.analyze_tickets(&["T-1", "T-2"]).await.unwrap();
    assert_eq!(lens.invalidate_ticket("T-1").unwrap(), 1);

    let batch = lens.analyze_tickets(&["T-1", "T-2"]).await.unwrap();
    assert_eq!(batch.statuses(), vec![ItemStatus::Succeeded, ItemStatus::Cached]);
    assert_eq!(gateway.calls(), 3);

    assert_eq!(lens.invalidate_model().unwrap(), 2);
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].payload["removed"], serde_json::json!(1));
    assert_eq!(lens.stats().invalidations, 3);
}

#[tokio::test]
async fn test_invalid_pattern_surfaces_cache_error() {
    let lens = lens(Arc::new(CountingGateway::default()));
    let err = lens.invalidate_tickets("ticketlens:[").unwrap_err();
    assert!(matches!(
        err,
        TicketLensError::Cache(CacheError::InvalidPattern { .. })
    ));
}

#[tokio::test]
async fn test_gateway_fn_with_config_file() {
    let path = std::env::temp_dir().join(format!("ticketlens-it-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "[cache]\nkey_prefix = \"it\"\ndefault_ttl_seconds = 30\n\n[batch]\nconcurrency_limit = 2\n",
    )
    .unwrap();

    let gateway = GatewayFn::new("echo", |payload: TicketPayload| async move {
        Ok::<_, AnalysisError>(AnalysisResult::new(
            payload.ticket_id,
            Sentiment::Neutral,
            0.0,
            1.0,
            "echo",
        ))
    });
    let lens = TicketLens::from_config_file(&path, Arc::new(gateway), Arc::new(IdOnlyPayloads))
        .unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(lens.batch_options().concurrency_limit, 2);
    let batch = lens.analyze_tickets(&["X"]).await.unwrap();
    assert_eq!(batch.succeeded_count, 1);
    assert!(lens.cache().contains("it:echo:ticket:X"));
    let ttl = lens.cache().ttl_remaining("it:echo:ticket:X").unwrap();
    assert!(ttl <= Duration::from_secs(30));
}

#[tokio::test]
async fn test_zero_concurrency_is_a_call_level_error() {
    let gateway = Arc::new(CountingGateway::default());
    let lens = lens(gateway.clone());
    let err = lens
        .processor()
        .process_batch(&["T-1"], 0, Duration::from_secs(60))
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::InvalidArgument(_)));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_sweeper_lifecycle() {
    let mut lens = lens(Arc::new(CountingGateway::default()));
    assert!(lens.start_sweeper());
    assert!(lens.start_sweeper());
    lens.stop_sweeper();

    let mut config = AppConfig::default();
    config.cache.sweep_interval_seconds = None;
    let mut quiet = TicketLens::new(
        config,
        Arc::new(CountingGateway::default()),
        Arc::new(IdOnlyPayloads),
    )
    .unwrap();
    assert!(!quiet.start_sweeper());
}

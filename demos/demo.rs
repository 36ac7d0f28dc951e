//! # TicketLens Demo
//!
//! Runs two batches through the facade with a keyword gateway:
//! - first run goes to the gateway, second run is served from the cache
//! - one ticket fails and is reported in place
//! - invalidation events are printed as they happen
//!
//! Run with `RUST_LOG=debug cargo run --example demo --features debug-logging`
//! to see the processor's logs.

use std::sync::Arc;
use std::time::Duration;
use ticketlens::prelude::*;

async fn keyword_analysis(payload: TicketPayload) -> Result<AnalysisResult, AnalysisError> {
    // Pretend to be a remote model
    tokio::time::sleep(Duration::from_millis(50)).await;

    if payload.body.is_empty() {
        return Err(AnalysisError::MalformedResponse(format!(
            "empty body for {}",
            payload.ticket_id
        )));
    }

    let body = payload.body.to_lowercase();
    let (sentiment, score) = if body.contains("refund") || body.contains("broken") {
        (Sentiment::Negative, -0.7)
    } else if body.contains("thanks") || body.contains("great") {
        (Sentiment::Positive, 0.8)
    } else {
        (Sentiment::Neutral, 0.0)
    };

    Ok(
        AnalysisResult::new(payload.ticket_id, sentiment, score, 0.9, "keyword-v1")
            .with_summary(payload.subject),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("🚀 TicketLens Demo\n");

    // Configuration
    let mut config = AppConfig::default();
    config.cache = CacheConfig::new(
        600,                // default_ttl_seconds
        "demo".to_string(), // key_prefix
    )
    .with_sweep_interval(30);
    config.batch = BatchConfig::new(3).with_item_timeout_ms(2_000);

    // Ticket payloads
    let payloads: StaticPayloads = [
        TicketPayload::new("T-100", "Login broken", "The login page is broken again"),
        TicketPayload::new("T-101", "Kudos", "Thanks, the new dashboard is great"),
        TicketPayload::new("T-102", "Question", "How do I export my invoices?"),
        TicketPayload::new("T-103", "Refund", "I want a refund for last month"),
        TicketPayload::new("T-104", "(no subject)", ""),
    ]
    .into_iter()
    .collect();

    let gateway = GatewayFn::new("keyword-v1", keyword_analysis);
    let mut lens = TicketLens::new(config, Arc::new(gateway), Arc::new(payloads))?;
    lens.start_sweeper();
    println!("✅ TicketLens ready (model: {})", lens.processor().model());

    // Signals
    lens.signals().add_callback(|event| {
        if event.event_type == EventType::CacheInvalidated {
            println!(
                "📡 invalidated {} entries matching {}",
                event.payload["removed"], event.payload["pattern"]
            );
        }
    })?;

    let ids = ["T-100", "T-101", "T-102", "T-103", "T-104", "T-999"];

    // First run
    println!("\n📝 First run");
    println!("------------");
    let batch = lens.analyze_tickets(&ids).await?;
    print_batch(&batch);

    // Second run
    println!("\n🗄️  Second run");
    println!("-------------");
    let batch = lens.analyze_tickets(&ids).await?;
    print_batch(&batch);

    // Invalidation
    println!("\n🧹 Invalidation");
    println!("---------------");
    lens.invalidate_ticket("T-101")?;
    lens.invalidate_tickets("demo:keyword-v1:ticket:T-10[0-2]")?;
    let batch = lens.analyze_tickets(&ids[..4]).await?;
    print_batch(&batch);

    // Stats
    let stats = lens.stats();
    println!("\n📊 Cache statistics");
    println!("-------------------");
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("hit rate: {:.1}%", stats.hit_rate() * 100.0);

    lens.stop_sweeper();
    println!("\n🎉 Demo completed");
    Ok(())
}

fn print_batch(batch: &BatchResult) {
    for item in &batch.items {
        match (item.result(), item.error()) {
            (Some(result), _) => println!(
                "  [{}] {:<6} {:?} -> {:?} ({:+.2})",
                item.index(),
                item.id(),
                item.status(),
                result.sentiment,
                result.score
            ),
            (None, Some(error)) => println!(
                "  [{}] {:<6} {:?} -> {}",
                item.index(),
                item.id(),
                item.status(),
                error
            ),
            (None, None) => println!("  [{}] {:<6} {:?}", item.index(), item.id(), item.status()),
        }
    }
    println!(
        "  cached={} succeeded={} failed={} batch={}",
        batch.cached_count, batch.succeeded_count, batch.failed_count, batch.batch_id
    );
}

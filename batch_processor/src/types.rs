//! Batch data model
//!
//! Ticket payloads going into the gateway, analysis results coming out, and
//! the per-item and per-batch outcome records.

use crate::errors::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall sentiment classification of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

/// What the analysis gateway produced for one ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticket_id: String,
    pub sentiment: Sentiment,
    /// Polarity in `-1.0..=1.0`
    pub score: f64,
    /// Model confidence in `0.0..=1.0`
    pub confidence: f64,
    pub model: String,
    pub summary: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(
        ticket_id: impl Into<String>,
        sentiment: Sentiment,
        score: f64,
        confidence: f64,
        model: impl Into<String>,
    ) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            sentiment,
            score: score.clamp(-1.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            model: model.into(),
            summary: None,
            analyzed_at: Utc::now(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Ticket content handed to the analysis gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketPayload {
    pub ticket_id: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl TicketPayload {
    pub fn new(ticket_id: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            subject: subject.into(),
            body: body.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Cached,
    Succeeded,
    Failed,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

/// Outcome of one position in a batch.
///
/// `result` is present exactly for `Cached` and `Succeeded`, `error` exactly
/// for `Failed`; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    index: usize,
    id: String,
    status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<AnalysisError>,
}

impl BatchItem {
    pub fn pending(index: usize, id: impl Into<String>) -> Self {
        Self {
            index,
            id: id.into(),
            status: ItemStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn cached(index: usize, id: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            index,
            id: id.into(),
            status: ItemStatus::Cached,
            result: Some(result),
            error: None,
        }
    }

    pub fn succeeded(index: usize, id: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            index,
            id: id.into(),
            status: ItemStatus::Succeeded,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(index: usize, id: impl Into<String>, error: AnalysisError) -> Self {
        Self {
            index,
            id: id.into(),
            status: ItemStatus::Failed,
            result: None,
            error: Some(error),
        }
    }

    /// Turn a still-pending item into a failure
    pub(crate) fn fail_pending(self, error: AnalysisError) -> Self {
        match self.status {
            ItemStatus::Pending => Self::failed(self.index, self.id, error),
            _ => self,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        self.error.as_ref()
    }
}

/// Outcome of one `process_batch` call, items in input order
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub items: Vec<BatchItem>,
    pub cached_count: usize,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchResult {
    /// Build a result, deriving the aggregate counts from the items
    pub fn new(batch_id: Uuid, items: Vec<BatchItem>, started_at: DateTime<Utc>) -> Self {
        let count = |status| items.iter().filter(|item| item.status == status).count();
        let cached_count = count(ItemStatus::Cached);
        let succeeded_count = count(ItemStatus::Succeeded);
        let failed_count = count(ItemStatus::Failed);

        Self {
            batch_id,
            cached_count,
            succeeded_count,
            failed_count,
            items,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when no item failed
    pub fn is_complete_success(&self) -> bool {
        self.failed_count == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchItem> {
        self.items
            .iter()
            .filter(|item| item.status == ItemStatus::Failed)
    }

    /// Results of cached and succeeded items, in input order
    pub fn results(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.items.iter().filter_map(BatchItem::result)
    }

    pub fn statuses(&self) -> Vec<ItemStatus> {
        self.items.iter().map(BatchItem::status).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str) -> AnalysisResult {
        AnalysisResult::new(id, Sentiment::Negative, -0.6, 0.9, "test-model")
    }

    #[test]
    fn test_item_invariants() {
        let cached = BatchItem::cached(0, "A", result("A"));
        assert!(cached.result().is_some() && cached.error().is_none());

        let failed = BatchItem::failed(1, "B", AnalysisError::Gateway("503".into()));
        assert!(failed.result().is_none() && failed.error().is_some());

        let pending = BatchItem::pending(2, "C");
        assert!(!pending.status().is_terminal());
        let timed_out = pending.fail_pending(AnalysisError::Timeout(10));
        assert_eq!(timed_out.status(), ItemStatus::Failed);

        let kept = cached.clone().fail_pending(AnalysisError::Timeout(10));
        assert_eq!(kept, cached);
    }

    #[test]
    fn test_counts_follow_items() {
        let items = vec![
            BatchItem::cached(0, "A", result("A")),
            BatchItem::succeeded(1, "B", result("B")),
            BatchItem::succeeded(2, "C", result("C")),
            BatchItem::failed(3, "D", AnalysisError::Timeout(5)),
        ];
        let batch = BatchResult::new(Uuid::new_v4(), items, Utc::now());
        assert_eq!(batch.cached_count, 1);
        assert_eq!(batch.succeeded_count, 2);
        assert_eq!(batch.failed_count, 1);
        assert!(!batch.is_complete_success());
        assert_eq!(batch.results().count(), 3);
        assert_eq!(batch.failures().map(BatchItem::id).collect::<Vec<_>>(), vec!["D"]);
    }

    #[test]
    fn test_scores_are_clamped() {
        let r = AnalysisResult::new("A", Sentiment::Positive, 3.0, -1.0, "m");
        assert_eq!(r.score, 1.0);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_item_serialization_omits_absent_fields() {
        let item = BatchItem::failed(0, "A", AnalysisError::RateLimited { retry_after_ms: Some(500) });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"]["kind"], "rate_limited");
        assert!(json.get("result").is_none());
    }
}

//! Analysis event types and definitions
//!
//! This module defines the structure of events emitted while batches run
//! and while cached analyses are invalidated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Analysis event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    BatchStarted,
    ItemCached,
    ItemSucceeded,
    ItemFailed,
    BatchFinished,
    CacheInvalidated,
}

/// Analysis event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEvent {
    /// Event type
    pub event_type: EventType,
    /// Batch the event belongs to, if any
    pub batch_id: Option<Uuid>,
    /// Ticket the event is about, if any
    pub ticket_id: Option<String>,
    /// Position of the ticket within its batch
    pub index: Option<usize>,
    /// Additional data
    pub payload: HashMap<String, serde_json::Value>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AnalysisEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            batch_id: None,
            ticket_id: None,
            index: None,
            payload: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_batch_id(mut self, batch_id: Uuid) -> Self {
        self.batch_id = Some(batch_id);
        self
    }

    pub fn with_ticket(mut self, index: usize, ticket_id: impl Into<String>) -> Self {
        self.index = Some(index);
        self.ticket_id = Some(ticket_id.into());
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.add_payload(key, value);
        self
    }

    pub fn add_payload(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.payload.insert(key.into(), value.into());
    }

    /// Whether the event reports the terminal state of one batch item
    pub fn is_item_event(&self) -> bool {
        matches!(
            self.event_type,
            EventType::ItemCached | EventType::ItemSucceeded | EventType::ItemFailed
        )
    }
}

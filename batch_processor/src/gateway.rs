//! Seams to the external collaborators: the AI analysis gateway and the
//! ticket payload supplier.

use crate::errors::AnalysisError;
use crate::types::{AnalysisResult, TicketPayload};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;

/// Produces a sentiment analysis for one ticket payload.
///
/// Implementations own retry and rate-limit policy; the batch processor
/// calls `analyze` at most once per cache miss and never retries.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze(&self, payload: TicketPayload) -> Result<AnalysisResult, AnalysisError>;

    /// Model/version identifier, part of every cache key
    fn model(&self) -> &str {
        "default"
    }
}

/// Adapts an async closure into an [`AnalysisGateway`]
pub struct GatewayFn<F> {
    model: String,
    analyze: F,
}

impl<F> GatewayFn<F> {
    pub fn new(model: impl Into<String>, analyze: F) -> Self {
        Self {
            model: model.into(),
            analyze,
        }
    }
}

impl<F> std::fmt::Debug for GatewayFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayFn").field("model", &self.model).finish()
    }
}

#[async_trait]
impl<F, Fut> AnalysisGateway for GatewayFn<F>
where
    F: Fn(TicketPayload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AnalysisResult, AnalysisError>> + Send + 'static,
{
    async fn analyze(&self, payload: TicketPayload) -> Result<AnalysisResult, AnalysisError> {
        (self.analyze)(payload).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Looks up the payload for a ticket id. Expected to be cheap.
pub trait PayloadSupplier: Send + Sync {
    fn payload(&self, ticket_id: &str) -> Result<TicketPayload, AnalysisError>;
}

impl<F> PayloadSupplier for F
where
    F: Fn(&str) -> Result<TicketPayload, AnalysisError> + Send + Sync,
{
    fn payload(&self, ticket_id: &str) -> Result<TicketPayload, AnalysisError> {
        self(ticket_id)
    }
}

/// In-memory supplier over payloads fetched ahead of time
#[derive(Debug, Clone, Default)]
pub struct StaticPayloads {
    payloads: HashMap<String, TicketPayload>,
}

impl StaticPayloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, payload: TicketPayload) {
        self.payloads.insert(payload.ticket_id.clone(), payload);
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

impl FromIterator<TicketPayload> for StaticPayloads {
    fn from_iter<I: IntoIterator<Item = TicketPayload>>(iter: I) -> Self {
        let mut payloads = Self::new();
        for payload in iter {
            payloads.insert(payload);
        }
        payloads
    }
}

impl PayloadSupplier for StaticPayloads {
    fn payload(&self, ticket_id: &str) -> Result<TicketPayload, AnalysisError> {
        self.payloads
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| AnalysisError::PayloadUnavailable(ticket_id.to_string()))
    }
}

/// Supplier for gateways that fetch ticket content themselves: the payload
/// carries only the id.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdOnlyPayloads;

impl PayloadSupplier for IdOnlyPayloads {
    fn payload(&self, ticket_id: &str) -> Result<TicketPayload, AnalysisError> {
        Ok(TicketPayload::new(ticket_id, "", ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sentiment;

    #[tokio::test]
    async fn test_gateway_fn_adapter() {
        let gateway = GatewayFn::new("keyword-v1", |payload: TicketPayload| async move {
            let sentiment = if payload.body.contains("refund") {
                Sentiment::Negative
            } else {
                Sentiment::Neutral
            };
            Ok::<_, AnalysisError>(AnalysisResult::new(
                payload.ticket_id,
                sentiment,
                0.0,
                0.5,
                "keyword-v1",
            ))
        });

        assert_eq!(gateway.model(), "keyword-v1");
        let result = gateway
            .analyze(TicketPayload::new("T-1", "Order", "I want a refund"))
            .await
            .unwrap();
        assert_eq!(result.sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_static_payloads() {
        let payloads: StaticPayloads = [TicketPayload::new("T-1", "s", "b")].into_iter().collect();
        assert_eq!(payloads.payload("T-1").unwrap().subject, "s");
        assert_eq!(
            payloads.payload("T-2"),
            Err(AnalysisError::PayloadUnavailable("T-2".to_string()))
        );
    }

    #[test]
    fn test_closure_supplier() {
        let supplier = |id: &str| Ok::<_, AnalysisError>(TicketPayload::new(id, "subject", "body"));
        assert_eq!(PayloadSupplier::payload(&supplier, "T-3").unwrap().ticket_id, "T-3");
        assert_eq!(IdOnlyPayloads.payload("T-4").unwrap().body, "");
    }
}

//! Charge request consumer

use crate::{
    rail::{PaymentRail, RailOutcome},
    Result,
};
use async_trait::async_trait;
use message_bus::{Message, MessageBus, MessageHandler, PartitionKey, Topic};
use std::sync::Arc;
use toll_model::{ChargeRequest, ChargeResponse, ChargeStatus};
use tracing::info;

/// Consumes charge requests, publishes exactly one response per request,
/// correlated by event id. Never touches ledger or cache.
pub struct ChargeProcessor {
    rail: Arc<dyn PaymentRail>,
    bus: Arc<MessageBus>,
}

impl ChargeProcessor {
    /// Create new processor
    pub fn new(rail: Arc<dyn PaymentRail>, bus: Arc<MessageBus>) -> Self {
        Self { rail, bus }
    }

    /// Process one request and publish the response
    pub async fn process(&self, request: &ChargeRequest) -> Result<()> {
        info!(
            event_id = %request.event_id,
            tag = %request.tag_id,
            amount = %request.amount,
            "charge request received"
        );

        let response = match self.rail.charge(request).await? {
            RailOutcome::Approved { approval_code } => ChargeResponse {
                event_id: request.event_id.clone(),
                tag_id: request.tag_id.clone(),
                status: ChargeStatus::Success,
                approval_code: Some(approval_code),
                failure_reason: None,
            },
            RailOutcome::Declined { reason } => ChargeResponse {
                event_id: request.event_id.clone(),
                tag_id: request.tag_id.clone(),
                status: ChargeStatus::Failed,
                approval_code: None,
                failure_reason: Some(reason),
            },
        };

        let message = Message::from_payload(
            Topic::ChargeResponse,
            PartitionKey::Tag(response.tag_id.to_string()),
            &response,
        )?;
        self.bus.publish(&message)?;

        info!(
            event_id = %response.event_id,
            status = ?response.status,
            "charge response published"
        );
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for ChargeProcessor {
    async fn handle(&self, message: Message) -> message_bus::Result<()> {
        let request: ChargeRequest = message.payload_as()?;
        self.process(&request)
            .await
            .map_err(|e| message_bus::Error::Handler(e.to_string()))
    }
}

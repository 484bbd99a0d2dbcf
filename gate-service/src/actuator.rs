//! Gate actuator: idempotency + barrier strategy + read model
//!
//! Open/deny at most once per event id. An OPEN schedules the
//! compensating CLOSE for the same lane back through the command topic
//! after the configured pulse, so downstream consumers and the read
//! model see a complete open->close cycle.

use crate::{
    barrier::BarrierStrategy,
    state::GateStateStore,
    Config, Result,
};
use async_trait::async_trait;
use message_bus::{Message, MessageBus, MessageHandler, PartitionKey, Topic};
use std::sync::Arc;
use toll_model::{Decision, GateCommand};
use tracing::{error, info};

/// Gate actuator service
pub struct GateActuator {
    barrier: Arc<dyn BarrierStrategy>,
    store: Arc<GateStateStore>,
    bus: Arc<MessageBus>,
    config: Config,
}

impl GateActuator {
    /// Create new actuator
    pub fn new(
        barrier: Arc<dyn BarrierStrategy>,
        store: Arc<GateStateStore>,
        bus: Arc<MessageBus>,
        config: Config,
    ) -> Self {
        Self {
            barrier,
            store,
            bus,
            config,
        }
    }

    /// Read-only access to the per-lane read model
    pub fn store(&self) -> &GateStateStore {
        &self.store
    }

    /// Actuate one command
    pub async fn handle_command(&self, cmd: &GateCommand) -> Result<()> {
        if self.store.is_processed(&cmd.event_id) {
            info!(event_id = %cmd.event_id, "duplicate command ignored (idempotent)");
            return Ok(());
        }

        match cmd.decision {
            Decision::Open => {
                self.barrier.open(cmd).await?;
                self.schedule_auto_close(cmd);
            }
            Decision::Deny => {
                self.barrier.deny(cmd).await?;
            }
            Decision::Close => {
                self.barrier.close(cmd).await?;
            }
        }

        self.store.apply(cmd);
        self.store.mark_processed(cmd.event_id.clone());
        Ok(())
    }

    fn schedule_auto_close(&self, cmd: &GateCommand) {
        let close = cmd.close_companion();
        let bus = self.bus.clone();
        let pulse = self.config.open_pulse();

        tokio::spawn(async move {
            tokio::time::sleep(pulse).await;
            let message = match Message::from_payload(
                Topic::GateCommand,
                PartitionKey::Lane {
                    plaza_id: close.lane.plaza_id.clone(),
                    lane_id: close.lane.lane_id.clone(),
                },
                &close,
            ) {
                Ok(m) => m,
                Err(e) => {
                    error!(event_id = %close.event_id, "failed to build auto-close: {e}");
                    return;
                }
            };
            if let Err(e) = bus.publish(&message) {
                error!(event_id = %close.event_id, "failed to publish auto-close: {e}");
            }
        });
    }
}

#[async_trait]
impl MessageHandler for GateActuator {
    async fn handle(&self, message: Message) -> message_bus::Result<()> {
        let cmd: GateCommand = message.payload_as()?;
        self.handle_command(&cmd)
            .await
            .map_err(|e| message_bus::Error::Handler(e.to_string()))
    }
}

//! Barrier hardware strategy
//!
//! Swap [`SimulatedBarrier`] for an implementation that talks to
//! PLC/MQTT/Modbus hardware; the actuator only sees this trait.

use crate::Result;
use async_trait::async_trait;
use toll_model::GateCommand;
use tracing::{info, warn};

/// Strategy for barrier actuation
#[async_trait]
pub trait BarrierStrategy: Send + Sync {
    /// Raise the barrier
    async fn open(&self, cmd: &GateCommand) -> Result<()>;

    /// Signal denial; barrier stays down
    async fn deny(&self, cmd: &GateCommand) -> Result<()>;

    /// Lower the barrier after an open pulse
    async fn close(&self, cmd: &GateCommand) -> Result<()>;
}

/// Simulated barrier: logs actuation, no hardware delay
#[derive(Debug, Default)]
pub struct SimulatedBarrier;

#[async_trait]
impl BarrierStrategy for SimulatedBarrier {
    async fn open(&self, cmd: &GateCommand) -> Result<()> {
        info!(
            lane = %cmd.lane,
            tag = %cmd.tag_id,
            event_id = %cmd.event_id,
            reason = %cmd.reason,
            "barrier OPEN"
        );
        Ok(())
    }

    async fn deny(&self, cmd: &GateCommand) -> Result<()> {
        warn!(
            lane = %cmd.lane,
            tag = %cmd.tag_id,
            event_id = %cmd.event_id,
            reason = %cmd.reason,
            "gate DENIED"
        );
        Ok(())
    }

    async fn close(&self, cmd: &GateCommand) -> Result<()> {
        info!(lane = %cmd.lane, event_id = %cmd.event_id, "barrier CLOSE");
        Ok(())
    }
}

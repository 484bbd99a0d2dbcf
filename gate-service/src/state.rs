//! In-memory read model and idempotency store
//!
//! Tracks processed event ids to avoid duplicate actuation, and the
//! last state per plaza:lane for diagnostics queries. Mutated only by
//! the actuator, after a command has been actuated.

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use toll_model::{Decision, EventId, GateCommand, LaneKey};

/// Per-lane read model for queries / dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateState {
    /// Toll plaza identifier
    pub plaza_id: String,
    /// Lane identifier
    pub lane_id: String,
    /// Event id of the last actuated command
    pub last_event_id: EventId,
    /// Last decision taken at this lane
    pub last_decision: Decision,
    /// Reason for the last decision
    pub last_reason: String,
    /// When the read model was last updated
    pub last_updated_at: DateTime<Utc>,
    /// Total OPEN actuations at this lane
    pub total_opens: u64,
    /// Total DENY signals at this lane
    pub total_denies: u64,
}

/// Idempotency set + per-lane read model
#[derive(Default)]
pub struct GateStateStore {
    lanes: DashMap<LaneKey, GateState>,
    processed: DashSet<EventId>,
}

impl GateStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a command with this event id was already actuated
    pub fn is_processed(&self, event_id: &EventId) -> bool {
        self.processed.contains(event_id)
    }

    /// Mark an event id actuated. Call only after actuation succeeded,
    /// so a crash mid-actuation leaves the event retryable.
    pub fn mark_processed(&self, event_id: EventId) {
        self.processed.insert(event_id);
    }

    /// Fold an actuated command into the per-lane read model.
    ///
    /// CLOSE updates the snapshot but increments neither counter.
    pub fn apply(&self, cmd: &GateCommand) {
        let mut state = self.lanes.entry(cmd.lane.clone()).or_insert_with(|| GateState {
            plaza_id: cmd.lane.plaza_id.clone(),
            lane_id: cmd.lane.lane_id.clone(),
            last_event_id: cmd.event_id.clone(),
            last_decision: cmd.decision,
            last_reason: cmd.reason.code().to_string(),
            last_updated_at: cmd.timestamp,
            total_opens: 0,
            total_denies: 0,
        });

        state.last_event_id = cmd.event_id.clone();
        state.last_decision = cmd.decision;
        state.last_reason = cmd.reason.code().to_string();
        state.last_updated_at = Utc::now();

        match cmd.decision {
            Decision::Open => state.total_opens += 1,
            Decision::Deny => state.total_denies += 1,
            Decision::Close => {}
        }
    }

    /// Diagnostics read API: last known state for a lane
    pub fn get(&self, plaza_id: &str, lane_id: &str) -> Option<GateState> {
        self.lanes
            .get(&LaneKey::new(plaza_id, lane_id))
            .map(|s| s.clone())
    }
}

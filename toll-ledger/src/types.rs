//! Ledger record types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use toll_model::{EventId, LaneKey, TagId, TagReadEvent, TxStatus, VehicleType};

/// Durable record of one toll transaction.
///
/// At most one record per event id. `new_balance` equals
/// `previous_balance` until the Payment-Result Applier confirms the
/// charge; the orchestrator never deducts speculatively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TollTransaction {
    /// Idempotency key (tag id + trip timestamp)
    pub event_id: EventId,
    /// Tag being charged
    pub tag_id: TagId,
    /// Registered vehicle number
    pub vehicle_number: String,
    /// Vehicle class used for pricing
    pub vehicle_type: VehicleType,
    /// Plaza where the read happened
    pub plaza_id: String,
    /// Lane within the plaza
    pub lane_id: String,
    /// Toll due
    pub toll_amount: Decimal,
    /// Cached balance before this transaction
    pub previous_balance: Decimal,
    /// Balance after finalization (equals previous until then)
    pub new_balance: Decimal,
    /// Saga status, monotonic
    pub status: TxStatus,
    /// Penalty charged on manual collection, if any
    pub manual_penalty_amount: Option<Decimal>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Transaction timestamp
    pub timestamp: DateTime<Utc>,
}

impl TollTransaction {
    /// Build a record from a tag read and the cached balance
    pub fn from_read(
        event_id: EventId,
        read: &TagReadEvent,
        previous_balance: Decimal,
        status: TxStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            event_id,
            tag_id: read.tag_id.clone(),
            vehicle_number: read.vehicle_number.clone(),
            vehicle_type: read.vehicle_type,
            plaza_id: read.trip.plaza_id.clone(),
            lane_id: read.trip.lane_id.clone(),
            toll_amount: read.trip.toll_amount,
            previous_balance,
            new_balance: previous_balance,
            status,
            manual_penalty_amount: None,
            created_at: now,
            timestamp: now,
        }
    }

    /// Lane key of the transaction
    pub fn lane(&self) -> LaneKey {
        LaneKey::new(self.plaza_id.clone(), self.lane_id.clone())
    }
}

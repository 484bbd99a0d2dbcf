//! Tag accounts, trip context and blacklist entries

use crate::ids::{LaneKey, TagId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Vehicle class used for rate lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    /// Cars, vans
    Light,
    /// Trucks, buses
    Heavy,
}

impl VehicleType {
    /// Rate-table code
    pub fn code(&self) -> &'static str {
        match self {
            VehicleType::Light => "LIGHT",
            VehicleType::Heavy => "HEAVY",
        }
    }
}

/// Trip status flag carried on a tag read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    /// Normal trip, eligible for automatic charging
    Pending,
    /// Operator/blacklist escalation: must be collected manually
    ManualRequired,
}

/// Trip context attached to a tag read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentTrip {
    /// Toll plaza where the read happened
    pub plaza_id: String,
    /// Lane within the plaza
    pub lane_id: String,
    /// Read timestamp as recorded by the lane reader (part of the event id)
    pub timestamp: String,
    /// Toll due for this plaza/lane/vehicle class
    pub toll_amount: Decimal,
    /// Trip status flag
    pub status: TripStatus,
}

impl CurrentTrip {
    /// Lane key for partition routing
    pub fn lane(&self) -> LaneKey {
        LaneKey::new(self.plaza_id.clone(), self.lane_id.clone())
    }
}

/// Cached account record for one tag (`TAG:<tagId>` cache entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagAccount {
    /// Tag identifier
    pub tag_id: TagId,
    /// Registered vehicle number
    pub vehicle_number: String,
    /// Vehicle class
    pub vehicle_type: VehicleType,
    /// Prepaid balance
    pub balance: Decimal,
    /// Trip in progress, if any
    pub current_trip: Option<CurrentTrip>,
}

/// Tag read event as published on `toll.tag.event`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagReadEvent {
    /// Tag identifier
    pub tag_id: TagId,
    /// Vehicle number as read at the lane
    pub vehicle_number: String,
    /// Vehicle class
    pub vehicle_type: VehicleType,
    /// Trip context (plaza, lane, timestamp, priced toll)
    pub trip: CurrentTrip,
}

/// Blacklist entry (`BLACKLIST:<tagId>` cache entry, TTL-bounded)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// Blocked tag
    pub tag_id: TagId,
    /// Why the tag was blocked (e.g. PAYMENT_FAILED)
    pub reason: String,
    /// When the entry was written
    pub timestamp: DateTime<Utc>,
}

//! Identifier newtypes

use serde::{Deserialize, Serialize};
use std::fmt;

/// RFID tag identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagId(String);

impl TagId {
    /// Create new tag ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Idempotency key for one toll transaction.
///
/// Derived from the tag id and the trip timestamp so that redelivery of
/// the same tag read always maps to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    /// Derive the event ID for a tag read: `<tagId>-<tripTimestamp>`
    pub fn derive(tag_id: &TagId, trip_timestamp: &str) -> Self {
        Self(format!("{}-{}", tag_id, trip_timestamp))
    }

    /// Wrap an already-derived event ID (e.g. from a message payload)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derived key for the compensating CLOSE command after an open pulse
    pub fn close_companion(&self) -> Self {
        Self(format!("{}-CLOSE", self.0))
    }

    /// Derived key for the gate OPEN issued on manual collection.
    /// Distinct from the original read's key, which the gate already
    /// consumed when it denied entry.
    pub fn manual_companion(&self) -> Self {
        Self(format!("{}-MANUAL", self.0))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Plaza + lane pair, the partition key for gate commands
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LaneKey {
    /// Toll plaza identifier
    pub plaza_id: String,
    /// Lane identifier within the plaza
    pub lane_id: String,
}

impl LaneKey {
    /// Create new lane key
    pub fn new(plaza_id: impl Into<String>, lane_id: impl Into<String>) -> Self {
        Self {
            plaza_id: plaza_id.into(),
            lane_id: lane_id.into(),
        }
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.plaza_id, self.lane_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_derivation_is_stable() {
        let tag = TagId::new("T1042");
        let a = EventId::derive(&tag, "2026-08-24T08:00:00Z");
        let b = EventId::derive(&tag, "2026-08-24T08:00:00Z");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "T1042-2026-08-24T08:00:00Z");
    }

    #[test]
    fn test_close_companion_differs_from_parent() {
        let id = EventId::new("T1-123");
        let close = id.close_companion();
        assert_ne!(id, close);
        assert_eq!(close.as_str(), "T1-123-CLOSE");
    }

    #[test]
    fn test_manual_companion_differs_from_parent_and_close() {
        let id = EventId::new("T1-123");
        let manual = id.manual_companion();
        assert_eq!(manual.as_str(), "T1-123-MANUAL");
        assert_ne!(manual, id.close_companion());
    }

    #[test]
    fn test_lane_key_display() {
        let lane = LaneKey::new("PLZ1", "L1");
        assert_eq!(lane.to_string(), "PLZ1:L1");
    }
}

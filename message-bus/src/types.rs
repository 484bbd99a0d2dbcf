//! Type definitions for message bus

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Saga topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Tag read with trip context, keyed by tag id
    TagEvent,
    /// Debit request, keyed by tag id
    ChargeRequest,
    /// Debit outcome, keyed by tag id
    ChargeResponse,
    /// Barrier command, keyed by plaza:lane
    GateCommand,
}

impl Topic {
    /// All saga topics
    pub const ALL: [Topic; 4] = [
        Topic::TagEvent,
        Topic::ChargeRequest,
        Topic::ChargeResponse,
        Topic::GateCommand,
    ];

    /// Topic name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Topic::TagEvent => "toll.tag.event",
            Topic::ChargeRequest => "toll.charge.request",
            Topic::ChargeResponse => "toll.charge.response",
            Topic::GateCommand => "toll.gate.command",
        }
    }

    /// Dead-letter channel for this topic
    pub fn dlt_name(&self) -> String {
        format!("{}.DLT", self.name())
    }

    /// Parse from a topic name
    pub fn from_name(name: &str) -> Result<Self> {
        Topic::ALL
            .iter()
            .copied()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::UnknownTopic(name.to_string()))
    }
}

/// Partition key for routing messages.
///
/// Messages with the same key are delivered in publish order; gate
/// commands are keyed by lane so OPEN/CLOSE pairs stay ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionKey {
    /// Partition by tag id
    Tag(String),
    /// Partition by plaza + lane
    Lane {
        /// Toll plaza identifier
        plaza_id: String,
        /// Lane identifier
        lane_id: String,
    },
}

impl PartitionKey {
    /// Routing string (mirrors the broker message key)
    pub fn routing_key(&self) -> String {
        match self {
            PartitionKey::Tag(id) => id.clone(),
            PartitionKey::Lane { plaza_id, lane_id } => format!("{}:{}", plaza_id, lane_id),
        }
    }

    /// Compute partition number for load balancing
    pub fn partition_number(&self, num_partitions: u32) -> u32 {
        let hash = blake3::hash(self.routing_key().as_bytes());
        let hash_bytes = hash.as_bytes();
        let hash_u32 =
            u32::from_le_bytes([hash_bytes[0], hash_bytes[1], hash_bytes[2], hash_bytes[3]]);
        hash_u32 % num_partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names() {
        assert_eq!(Topic::TagEvent.name(), "toll.tag.event");
        assert_eq!(Topic::GateCommand.dlt_name(), "toll.gate.command.DLT");
        assert_eq!(
            Topic::from_name("toll.charge.request").unwrap(),
            Topic::ChargeRequest
        );
        assert!(Topic::from_name("toll.unknown").is_err());
    }

    #[test]
    fn test_lane_routing_key() {
        let key = PartitionKey::Lane {
            plaza_id: "PLZ1".to_string(),
            lane_id: "L1".to_string(),
        };
        assert_eq!(key.routing_key(), "PLZ1:L1");
    }

    #[test]
    fn test_partition_number_is_stable() {
        let key = PartitionKey::Tag("T1042".to_string());
        let partition = key.partition_number(32);
        assert!(partition < 32);
        assert_eq!(partition, key.partition_number(32));
    }
}

//! Message envelope for pub/sub

use crate::error::{Error, Result};
use crate::types::{PartitionKey, Topic};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Message envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// Topic the message belongs to
    pub topic: Topic,

    /// Partition key for routing
    pub partition_key: PartitionKey,

    /// Payload (JSON-serialized)
    pub payload: serde_json::Value,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Headers (metadata)
    pub headers: std::collections::HashMap<String, String>,
}

impl Message {
    /// Create new message from a serializable payload
    pub fn from_payload<T: Serialize>(
        topic: Topic,
        partition_key: PartitionKey,
        payload: &T,
    ) -> Result<Self> {
        let payload =
            serde_json::to_value(payload).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Self {
            id: Uuid::now_v7(),
            topic,
            partition_key,
            payload,
            timestamp: Utc::now(),
            headers: std::collections::HashMap::new(),
        })
    }

    /// Add header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Decode the payload
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

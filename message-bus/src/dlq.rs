//! Dead-letter routing and replay
//!
//! Exhausted messages are republished, unmodified, on `<topic>.DLT`
//! (same partition key as the source) and held in a per-topic queue for
//! operator-triggered replay back into the original topic. Replay
//! safety relies on the idempotency checks in the target consumers.

use crate::{
    bus::MessageBus,
    message::Message,
    metrics::MESSAGE_DLT_TOTAL,
    types::Topic,
    Result,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// DLQ entry with failure metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqEntry {
    /// Entry id
    pub id: Uuid,
    /// The failed message, byte-for-byte as originally published
    pub original_message: Message,
    /// Last handler error
    pub failure_reason: String,
    /// Handler attempts before exhaustion
    pub retry_count: u32,
    /// When the entry was recorded
    pub failed_at: DateTime<Utc>,
}

/// DLQ statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct DlqStats {
    /// Entries currently held across all topics
    pub total_entries: usize,
    /// Entries per topic
    pub by_topic: std::collections::HashMap<String, usize>,
    /// Entries per failure reason
    pub by_reason: std::collections::HashMap<String, usize>,
}

/// Dead-letter router
pub struct DlqRouter {
    bus: Arc<MessageBus>,
    queues: DashMap<Topic, Mutex<VecDeque<DlqEntry>>>,
}

impl DlqRouter {
    /// Create new DLQ router
    pub fn new(bus: Arc<MessageBus>) -> Self {
        Self {
            bus,
            queues: DashMap::new(),
        }
    }

    /// Route a message to its topic's dead-letter channel.
    ///
    /// The message is republished verbatim on `<topic>.DLT` and queued
    /// for replay.
    pub fn route_to_dlq(
        &self,
        message: Message,
        failure_reason: String,
        retry_count: u32,
    ) -> Result<Uuid> {
        let topic = message.topic;
        let entry = DlqEntry {
            id: Uuid::new_v4(),
            original_message: message.clone(),
            failure_reason: failure_reason.clone(),
            retry_count,
            failed_at: Utc::now(),
        };
        let entry_id = entry.id;

        self.bus.publish_to(&topic.dlt_name(), &message)?;

        self.queues
            .entry(topic)
            .or_insert_with(|| Mutex::new(VecDeque::new()))
            .lock()
            .push_back(entry);

        MESSAGE_DLT_TOTAL.with_label_values(&[topic.name()]).inc();

        warn!(
            topic = topic.name(),
            message_id = %message.id,
            retry_count,
            "message moved to DLT: {failure_reason}"
        );

        Ok(entry_id)
    }

    /// Replay up to `max_batch` dead-lettered messages back onto their
    /// original topic, verbatim. Returns the number replayed.
    pub fn replay(&self, topic: Topic, max_batch: usize) -> Result<usize> {
        let mut replayed = 0;

        if let Some(queue) = self.queues.get(&topic) {
            let mut queue = queue.lock();
            while replayed < max_batch {
                let Some(entry) = queue.pop_front() else {
                    break;
                };
                info!(
                    topic = topic.name(),
                    message_id = %entry.original_message.id,
                    "replaying DLT message"
                );
                self.bus.publish(&entry.original_message)?;
                replayed += 1;
            }
        }

        info!(
            topic = topic.name(),
            replayed, "DLT replay complete"
        );
        Ok(replayed)
    }

    /// Snapshot of the entries currently held for a topic
    pub fn entries(&self, topic: Topic) -> Vec<DlqEntry> {
        self.queues
            .get(&topic)
            .map(|q| q.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get DLQ statistics
    pub fn stats(&self) -> DlqStats {
        let mut total = 0;
        let mut by_topic = std::collections::HashMap::new();
        let mut by_reason = std::collections::HashMap::new();

        for queue in self.queues.iter() {
            let entries = queue.value().lock();
            total += entries.len();
            by_topic.insert(queue.key().name().to_string(), entries.len());
            for entry in entries.iter() {
                *by_reason.entry(entry.failure_reason.clone()).or_insert(0) += 1;
            }
        }

        DlqStats {
            total_entries: total,
            by_topic,
            by_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PartitionKey;
    use serde_json::json;

    fn failed_message() -> Message {
        Message::from_payload(
            Topic::ChargeRequest,
            PartitionKey::Tag("T9".to_string()),
            &json!({"event_id": "T9-1", "amount": "30"}),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_dead_letter_copy_is_verbatim() {
        let bus = Arc::new(MessageBus::new());
        let router = DlqRouter::new(bus.clone());
        let mut dlt_rx = bus.subscribe(&Topic::ChargeRequest.dlt_name());

        let message = failed_message();
        router
            .route_to_dlq(message.clone(), "store unavailable".to_string(), 4)
            .unwrap();

        let copy = dlt_rx.recv().await.unwrap();
        assert_eq!(copy.id, message.id);
        assert_eq!(copy.payload, message.payload);
        assert_eq!(copy.partition_key, message.partition_key);
    }

    #[tokio::test]
    async fn test_replay_republishes_to_original_topic() {
        let bus = Arc::new(MessageBus::new());
        let router = DlqRouter::new(bus.clone());
        let mut main_rx = bus.subscribe(Topic::ChargeRequest.name());

        let message = failed_message();
        router
            .route_to_dlq(message.clone(), "timeout".to_string(), 4)
            .unwrap();

        let replayed = router.replay(Topic::ChargeRequest, 10).unwrap();
        assert_eq!(replayed, 1);

        let back = main_rx.recv().await.unwrap();
        assert_eq!(back.id, message.id);
        assert_eq!(back.payload, message.payload);

        // Queue drained; second replay is a no-op
        assert_eq!(router.replay(Topic::ChargeRequest, 10).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replay_respects_batch_bound() {
        let bus = Arc::new(MessageBus::new());
        let router = DlqRouter::new(bus.clone());

        for _ in 0..5 {
            router
                .route_to_dlq(failed_message(), "timeout".to_string(), 4)
                .unwrap();
        }

        assert_eq!(router.replay(Topic::ChargeRequest, 3).unwrap(), 3);
        assert_eq!(router.entries(Topic::ChargeRequest).len(), 2);
    }

    #[tokio::test]
    async fn test_stats_group_by_reason() {
        let bus = Arc::new(MessageBus::new());
        let router = DlqRouter::new(bus);

        router
            .route_to_dlq(failed_message(), "timeout".to_string(), 4)
            .unwrap();
        router
            .route_to_dlq(failed_message(), "timeout".to_string(), 4)
            .unwrap();
        router
            .route_to_dlq(failed_message(), "bad schema".to_string(), 4)
            .unwrap();

        let stats = router.stats();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.by_reason["timeout"], 2);
        assert_eq!(stats.by_reason["bad schema"], 1);
    }
}

//! In-process message bus
//!
//! One broadcast channel per channel name (topic or `<topic>.DLT`).
//! Publish order is delivery order, which gives per-key ordering for
//! free since all messages of one topic share a channel.

use crate::{
    message::Message,
    metrics::MESSAGE_PUBLISH_TOTAL,
    Result,
};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

/// Default channel capacity per topic
const DEFAULT_CAPACITY: usize = 1024;

/// In-process message bus
pub struct MessageBus {
    channels: DashMap<String, broadcast::Sender<Message>>,
    capacity: usize,
}

impl MessageBus {
    /// Create a bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with explicit per-channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<Message> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Publish a message on its own topic channel
    pub fn publish(&self, message: &Message) -> Result<()> {
        self.publish_to(message.topic.name(), message)
    }

    /// Publish a message on an explicit channel (used for `<topic>.DLT`)
    pub fn publish_to(&self, channel: &str, message: &Message) -> Result<()> {
        let sender = self.sender(channel);

        // A send error only means no live subscribers; the message is
        // not an error condition for the publisher.
        let delivered = sender.send(message.clone()).is_ok();

        MESSAGE_PUBLISH_TOTAL
            .with_label_values(&[channel, if delivered { "delivered" } else { "dropped" }])
            .inc();

        debug!(
            channel,
            message_id = %message.id,
            key = %message.partition_key.routing_key(),
            delivered,
            "published message"
        );

        Ok(())
    }

    /// Subscribe to a channel by name
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<Message> {
        self.sender(channel).subscribe()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

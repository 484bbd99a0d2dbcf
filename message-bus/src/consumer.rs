//! Message consumer with retry and dead-letter routing

use crate::{
    bus::MessageBus,
    dlq::DlqRouter,
    message::Message,
    metrics::{MESSAGE_PROCESS_DURATION, MESSAGE_RECEIVE_TOTAL},
    retry::RetryPolicy,
    types::Topic,
    Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Message handler trait
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle incoming message
    async fn handle(&self, message: Message) -> Result<()>;
}

/// Topic consumer.
///
/// Wraps a handler with the retry policy; exhausted messages go to the
/// dead-letter router unmodified and the consumer keeps going, so one
/// poison message never blocks the topic.
pub struct Consumer {
    bus: Arc<MessageBus>,
    dlq: Arc<DlqRouter>,
    topic: Topic,
    policy: RetryPolicy,
}

impl Consumer {
    /// Create new consumer
    pub fn new(
        bus: Arc<MessageBus>,
        dlq: Arc<DlqRouter>,
        topic: Topic,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            bus,
            dlq,
            topic,
            policy,
        }
    }

    /// Spawn the consume loop as a task
    pub fn spawn<H>(self, handler: Arc<H>) -> JoinHandle<()>
    where
        H: MessageHandler + 'static,
    {
        let mut rx = self.bus.subscribe(self.topic.name());
        info!(topic = self.topic.name(), "consumer started");

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => {
                        self.process(handler.as_ref(), message).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Broadcast overrun loses messages for real; an
                        // at-least-once broker would redeliver them.
                        MESSAGE_RECEIVE_TOTAL
                            .with_label_values(&[self.topic.name(), "lost"])
                            .inc_by(skipped as f64);
                        warn!(
                            topic = self.topic.name(),
                            skipped, "consumer lagged, messages dropped"
                        );
                    }
                    Err(RecvError::Closed) => {
                        info!(topic = self.topic.name(), "channel closed, consumer stopping");
                        break;
                    }
                }
            }
        })
    }

    async fn process<H: MessageHandler>(&self, handler: &H, message: Message) {
        let start = Instant::now();
        let mut attempt: u32 = 1;

        loop {
            match handler.handle(message.clone()).await {
                Ok(()) => {
                    MESSAGE_RECEIVE_TOTAL
                        .with_label_values(&[self.topic.name(), "success"])
                        .inc();
                    MESSAGE_PROCESS_DURATION
                        .with_label_values(&[self.topic.name()])
                        .observe(start.elapsed().as_secs_f64());
                    return;
                }
                Err(e) => match self.policy.delay_after(attempt) {
                    Some(delay) => {
                        warn!(
                            topic = self.topic.name(),
                            message_id = %message.id,
                            attempt,
                            ?delay,
                            "handler failed, retrying: {e}"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        error!(
                            topic = self.topic.name(),
                            message_id = %message.id,
                            attempt,
                            "retries exhausted, routing to DLT: {e}"
                        );
                        MESSAGE_RECEIVE_TOTAL
                            .with_label_values(&[self.topic.name(), "dead_lettered"])
                            .inc();
                        if let Err(dlq_err) =
                            self.dlq.route_to_dlq(message, e.to_string(), attempt)
                        {
                            error!("failed to dead-letter message: {dlq_err}");
                        }
                        return;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PartitionKey;
    use crate::Error;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyHandler {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl MessageHandler for FlakyHandler {
        async fn handle(&self, _message: Message) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(Error::Handler("transient".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn test_message() -> Message {
        Message::from_payload(
            Topic::ChargeRequest,
            PartitionKey::Tag("T1".to_string()),
            &json!({"event_id": "T1-1"}),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried_until_success() {
        let bus = Arc::new(MessageBus::new());
        let dlq = Arc::new(DlqRouter::new(bus.clone()));
        let handler = Arc::new(FlakyHandler {
            calls: AtomicU32::new(0),
            fail_first: 2,
        });

        let consumer = Consumer::new(
            bus.clone(),
            dlq.clone(),
            Topic::ChargeRequest,
            RetryPolicy::default(),
        );
        let task = consumer.spawn(handler.clone());

        bus.publish(&test_message()).unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
        assert_eq!(dlq.stats().total_entries, 0);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_dead_letter_the_message() {
        let bus = Arc::new(MessageBus::new());
        let dlq = Arc::new(DlqRouter::new(bus.clone()));
        let handler = Arc::new(FlakyHandler {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        });

        let consumer = Consumer::new(
            bus.clone(),
            dlq.clone(),
            Topic::ChargeRequest,
            RetryPolicy::default(),
        );
        let task = consumer.spawn(handler.clone());

        let message = test_message();
        bus.publish(&message).unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;

        // 4 attempts, then dead-lettered verbatim
        assert_eq!(handler.calls.load(Ordering::SeqCst), 4);
        let entries = dlq.entries(Topic::ChargeRequest);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_message.id, message.id);
        assert_eq!(entries[0].original_message.payload, message.payload);
        task.abort();
    }
}

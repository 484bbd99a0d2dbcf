//! Message bus for the toll transaction rail
//!
//! Provides pub/sub messaging with:
//! - Partitioning by tag id and by plaza:lane
//! - Per-topic channels with publish-order delivery
//! - Bounded exponential-backoff retry around every consumer
//! - Dead-letter routing on retry exhaustion with manual replay
//! - Observability via Prometheus metrics
//!
//! The bus is in-process; a broker-backed transport would slot in behind
//! the same `publish`/`subscribe` seams without touching the consumers.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bus;
pub mod consumer;
pub mod dlq;
pub mod error;
pub mod message;
pub mod metrics;
pub mod retry;
pub mod types;

pub use bus::MessageBus;
pub use consumer::{Consumer, MessageHandler};
pub use dlq::{DlqEntry, DlqRouter, DlqStats};
pub use error::{Error, Result};
pub use message::Message;
pub use retry::RetryPolicy;
pub use types::{PartitionKey, Topic};

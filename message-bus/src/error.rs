//! Error types for message bus

use thiserror::Error;

/// Message bus error
#[derive(Debug, Error)]
pub enum Error {
    /// Publish error
    #[error("Publish error: {0}")]
    Publish(String),

    /// Subscribe error
    #[error("Subscribe error: {0}")]
    Subscribe(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Handler rejected the message (retried, then dead-lettered)
    #[error("Handler error: {0}")]
    Handler(String),

    /// Unknown topic name
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the gate service

use thiserror::Error;

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Gate service errors
#[derive(Error, Debug)]
pub enum Error {
    /// Barrier hardware / simulation failure
    #[error("Barrier error: {0}")]
    Barrier(String),

    /// Malformed gate command payload
    #[error("Bad command: {0}")]
    BadCommand(String),

    /// Message bus error
    #[error("Bus error: {0}")]
    Bus(#[from] message_bus::Error),
}

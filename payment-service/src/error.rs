//! Error types for the charge processor

use thiserror::Error;

/// Result type for charge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Charge processor errors
#[derive(Error, Debug)]
pub enum Error {
    /// Rail infrastructure failure (retried, then dead-lettered)
    #[error("Rail error: {0}")]
    Rail(String),

    /// Message bus error
    #[error("Bus error: {0}")]
    Bus(#[from] message_bus::Error),
}

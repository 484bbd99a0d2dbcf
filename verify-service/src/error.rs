//! Error types for the verify service

use thiserror::Error;

/// Result type for saga operations
pub type Result<T> = std::result::Result<T, Error>;

/// Verify service errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] toll_ledger::Error),

    /// Message bus error
    #[error("Bus error: {0}")]
    Bus(#[from] message_bus::Error),

    /// Vendor lookup infrastructure failure
    #[error("Vendor error: {0}")]
    Vendor(String),

    /// Manual collection for an event id the ledger has never seen
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
}

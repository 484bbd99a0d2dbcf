//! Durable toll transaction ledger
//!
//! Append-style RocksDB store for [`TollTransaction`] records. One record
//! per event id (the saga's idempotency key), updated at most twice
//! (pending -> terminal), never deleted: the ledger is the audit trail
//! the rest of the system reconciles against.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod ledger;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use ledger::TollLedger;
pub use types::TollTransaction;

//! Toll transaction saga: orchestrator and payment-result applier
//!
//! Consumes tag reads, evaluates blacklist and balance against the
//! rate-priced toll, persists the ledger record and only then emits
//! charge requests and gate commands (publish-after-commit). The
//! applier finalizes each transaction from the charge response: it is
//! the single writer of terminal ledger status and the only component
//! that mutates cached balances.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod admin;
pub mod applier;
pub mod cache;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod rates;
pub mod vendor;

pub use admin::DemoSeeder;
pub use applier::PaymentResultApplier;
pub use cache::{BlacklistCache, TagCache, TtlCache};
pub use config::{Config, GatePolicy};
pub use error::{Error, Result};
pub use orchestrator::{Admission, TransactionOrchestrator};
pub use rates::RateTable;
pub use vendor::{refresh_cached_tags, StaticVendorDirectory, VendorDirectory};

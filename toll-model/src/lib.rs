//! Shared domain and message types for the toll transaction rail
//!
//! Everything that crosses a topic boundary lives here:
//! - Tag accounts and trip context
//! - Charge request/response messages
//! - Gate commands and decisions
//! - Ledger transaction statuses

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod ids;
pub mod messages;
pub mod status;
pub mod tag;

pub use ids::{EventId, LaneKey, TagId};
pub use messages::{
    ChargeRequest, ChargeResponse, ChargeStatus, Decision, GateCommand, GateReason,
};
pub use status::TxStatus;
pub use tag::{BlacklistEntry, CurrentTrip, TagAccount, TagReadEvent, TripStatus, VehicleType};

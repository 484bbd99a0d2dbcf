//! Charge processor
//!
//! Consumes charge requests and publishes charge responses. Stateless:
//! the outcome is a function of the request plus the payment rail, so
//! the whole component can be swapped without touching transaction
//! state. In real life the rail calls an issuer/bank with retries.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod processor;
pub mod rail;

pub use error::{Error, Result};
pub use processor::ChargeProcessor;
pub use rail::{PaymentRail, RailOutcome, SimulatedRail};

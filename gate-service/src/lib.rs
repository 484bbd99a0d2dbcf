//! Gate actuator service
//!
//! Consumes `toll.gate.command`, drives the barrier exactly once per
//! event id, self-publishes the compensating CLOSE after an open pulse,
//! and maintains the per-lane read-model queried by diagnostics.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod actuator;
pub mod barrier;
pub mod config;
pub mod error;
pub mod state;

pub use actuator::GateActuator;
pub use barrier::{BarrierStrategy, SimulatedBarrier};
pub use config::Config;
pub use error::{Error, Result};
pub use state::{GateState, GateStateStore};

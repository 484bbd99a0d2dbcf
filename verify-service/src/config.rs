//! Configuration for the verify service

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When the gate opens relative to payment confirmation.
///
/// The business intent is ambiguous in the field: optimistic opening
/// favors throughput (the vehicle is physically past the barrier before
/// any charge settles), waiting favors correctness but can stall a
/// lane. Optimistic is the default; failures are compensated by
/// balance revert + blacklist, never by re-closing on the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatePolicy {
    /// OPEN immediately with reason PAYMENT_REQUESTED
    Optimistic,
    /// OPEN only after the charge response confirms success
    WaitForConfirmation,
}

/// Verify service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tag account cache TTL (seconds)
    pub cache_ttl_secs: u64,

    /// Blacklist entry TTL (seconds)
    pub blacklist_ttl_secs: u64,

    /// Gate-open policy
    pub gate_policy: GatePolicy,

    /// Manual-collection penalty multiplier (penalty = toll x multiplier)
    pub penalty_multiplier: Decimal,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            blacklist_ttl_secs: 24 * 60 * 60,
            gate_policy: GatePolicy::Optimistic,
            penalty_multiplier: Decimal::TWO,
        }
    }
}

impl Config {
    /// Tag cache TTL as a [`Duration`]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Blacklist TTL as a [`Duration`]
    pub fn blacklist_ttl(&self) -> Duration {
        Duration::from_secs(self.blacklist_ttl_secs)
    }
}

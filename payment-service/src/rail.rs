//! Payment rail abstraction

use crate::Result;
use async_trait::async_trait;
use rand::Rng;
use toll_model::ChargeRequest;
use uuid::Uuid;

/// Outcome of a charge attempt against the rail.
///
/// A declined charge is a business outcome, not an error; rail errors
/// (connectivity, timeouts) surface as `Err` and go through retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RailOutcome {
    /// Debit approved
    Approved {
        /// Issuer approval code
        approval_code: String,
    },
    /// Debit declined
    Declined {
        /// Issuer decline reason
        reason: String,
    },
}

/// External payment rail
#[async_trait]
pub trait PaymentRail: Send + Sync {
    /// Attempt the debit
    async fn charge(&self, request: &ChargeRequest) -> Result<RailOutcome>;
}

/// Simulated rail with a configurable decline probability
#[derive(Debug)]
pub struct SimulatedRail {
    failure_percent: u8,
}

impl SimulatedRail {
    /// Create a rail declining roughly `failure_percent` of charges
    pub fn new(failure_percent: u8) -> Self {
        Self { failure_percent }
    }

    /// Rail that approves everything (tests, demos)
    pub fn always_approve() -> Self {
        Self::new(0)
    }

    /// Rail that declines everything (tests)
    pub fn always_decline() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl PaymentRail for SimulatedRail {
    async fn charge(&self, _request: &ChargeRequest) -> Result<RailOutcome> {
        let roll: u8 = rand::thread_rng().gen_range(0..100);
        if roll < self.failure_percent {
            Ok(RailOutcome::Declined {
                reason: "Simulated gateway failure".to_string(),
            })
        } else {
            Ok(RailOutcome::Approved {
                approval_code: format!("APP-{}", Uuid::new_v4()),
            })
        }
    }
}

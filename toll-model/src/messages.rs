//! Saga messages: charge request/response and gate commands

use crate::ids::{EventId, LaneKey, TagId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Debit request published on `toll.charge.request`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Transaction event id (correlation + idempotency)
    pub event_id: EventId,
    /// Tag to debit
    pub tag_id: TagId,
    /// Toll to charge
    pub amount: Decimal,
    /// When the request was issued
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a charge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeStatus {
    /// Debit approved
    Success,
    /// Debit declined or rail error
    Failed,
}

/// Charge outcome published on `toll.charge.response`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeResponse {
    /// Transaction event id this response correlates to
    pub event_id: EventId,
    /// Tag that was charged
    pub tag_id: TagId,
    /// Success or failure
    pub status: ChargeStatus,
    /// Issuer approval code, present on success
    pub approval_code: Option<String>,
    /// Failure reason, present on failure
    pub failure_reason: Option<String>,
}

/// Barrier decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Raise the barrier
    Open,
    /// Signal denial, barrier stays down
    Deny,
    /// Compensating close after an open pulse
    Close,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Open => "OPEN",
            Decision::Deny => "DENY",
            Decision::Close => "CLOSE",
        };
        write!(f, "{}", s)
    }
}

/// Why a gate decision was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateReason {
    /// Optimistic open while the charge is in flight
    PaymentRequested,
    /// Charge confirmed
    Paid,
    /// Balance below toll
    InsufficientFunds,
    /// Charge declined after the fact
    PaymentFailed,
    /// Trip flagged for manual intervention
    ManualRequired,
    /// Operator collected the toll at the booth
    ManualCollected,
    /// Self-published close at end of the open pulse
    AutoClose,
}

impl GateReason {
    /// Wire code, also used in audit logs
    pub fn code(&self) -> &'static str {
        match self {
            GateReason::PaymentRequested => "PAYMENT_REQUESTED",
            GateReason::Paid => "PAID",
            GateReason::InsufficientFunds => "INSUFFICIENT_FUNDS",
            GateReason::PaymentFailed => "PAYMENT_FAILED",
            GateReason::ManualRequired => "MANUAL_REQUIRED",
            GateReason::ManualCollected => "MANUAL_COLLECTED",
            GateReason::AutoClose => "AUTO_CLOSE",
        }
    }
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Barrier command published on `toll.gate.command`, keyed by lane.
/// Immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCommand {
    /// Transaction event id (idempotency key for actuation)
    pub event_id: EventId,
    /// Tag the decision applies to
    pub tag_id: TagId,
    /// Plaza + lane the command targets
    pub lane: LaneKey,
    /// Open, deny or close
    pub decision: Decision,
    /// Why
    pub reason: GateReason,
    /// When the command was created upstream
    pub timestamp: DateTime<Utc>,
}

impl GateCommand {
    /// Create a command stamped with the current time
    pub fn new(
        event_id: EventId,
        tag_id: TagId,
        lane: LaneKey,
        decision: Decision,
        reason: GateReason,
    ) -> Self {
        Self {
            event_id,
            tag_id,
            lane,
            decision,
            reason,
            timestamp: Utc::now(),
        }
    }

    /// Compensating CLOSE for the same lane after this OPEN's pulse
    pub fn close_companion(&self) -> Self {
        Self::new(
            self.event_id.close_companion(),
            self.tag_id.clone(),
            self.lane.clone(),
            Decision::Close,
            GateReason::AutoClose,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_cmd() -> GateCommand {
        GateCommand::new(
            EventId::new("T1-100"),
            TagId::new("T1"),
            LaneKey::new("PLZ1", "L1"),
            Decision::Open,
            GateReason::Paid,
        )
    }

    #[test]
    fn test_close_companion_targets_same_lane() {
        let open = open_cmd();
        let close = open.close_companion();
        assert_eq!(close.lane, open.lane);
        assert_eq!(close.decision, Decision::Close);
        assert_eq!(close.reason, GateReason::AutoClose);
        assert_ne!(close.event_id, open.event_id);
    }

    #[test]
    fn test_charge_request_round_trip() {
        let req = ChargeRequest {
            event_id: EventId::new("T1-100"),
            tag_id: TagId::new("T1"),
            amount: dec!(30),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: ChargeRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_id, req.event_id);
        assert_eq!(back.amount, req.amount);
    }
}

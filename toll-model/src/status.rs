//! Ledger transaction status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a toll transaction in the ledger.
///
/// Transitions are monotonic: `PendingPayment` may move to exactly one
/// terminal status, and terminal statuses never change again (except
/// `Failed -> ManualCollected`, the operator recovery path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Ledger record written, charge response outstanding
    PendingPayment,
    /// Charge confirmed, balance deducted
    Success,
    /// Charge declined, balance reverted, tag blacklisted
    Failed,
    /// Balance below toll at read time
    InsufficientFunds,
    /// Trip flagged for manual intervention at read time
    ManualRequired,
    /// Operator collected toll + penalty at the booth
    ManualCollected,
}

impl TxStatus {
    /// Terminal statuses never transition again (modulo manual collection)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::PendingPayment)
    }

    /// Whether a transition from `self` to `next` preserves monotonicity
    pub fn can_transition_to(&self, next: TxStatus) -> bool {
        match self {
            TxStatus::PendingPayment => matches!(
                next,
                TxStatus::Success | TxStatus::Failed | TxStatus::ManualCollected
            ),
            // Manual collection recovers a failed or manual-required tx
            TxStatus::Failed | TxStatus::ManualRequired => {
                matches!(next, TxStatus::ManualCollected)
            }
            _ => false,
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::PendingPayment => "PENDING_PAYMENT",
            TxStatus::Success => "SUCCESS",
            TxStatus::Failed => "FAILED",
            TxStatus::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TxStatus::ManualRequired => "MANUAL_REQUIRED",
            TxStatus::ManualCollected => "MANUAL_COLLECTED",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_reaches_all_payment_outcomes() {
        assert!(TxStatus::PendingPayment.can_transition_to(TxStatus::Success));
        assert!(TxStatus::PendingPayment.can_transition_to(TxStatus::Failed));
        assert!(!TxStatus::PendingPayment.can_transition_to(TxStatus::PendingPayment));
    }

    #[test]
    fn test_terminal_statuses_are_sticky() {
        assert!(!TxStatus::Success.can_transition_to(TxStatus::Failed));
        assert!(!TxStatus::InsufficientFunds.can_transition_to(TxStatus::Success));
        assert!(!TxStatus::ManualCollected.can_transition_to(TxStatus::Success));
    }

    #[test]
    fn test_manual_collection_recovers_failures() {
        assert!(TxStatus::Failed.can_transition_to(TxStatus::ManualCollected));
        assert!(TxStatus::ManualRequired.can_transition_to(TxStatus::ManualCollected));
    }
}

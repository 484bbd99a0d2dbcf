//! Ledger API
//!
//! Single entry point for the orchestrator and the payment-result
//! applier. Enforces the two ledger invariants:
//! - at most one record per event id (`insert_new` is the duplicate check)
//! - monotonic status transitions (`finalize` rejects terminal -> anything)

use crate::{
    error::{Error, Result},
    storage::Storage,
    types::TollTransaction,
    Config,
};
use rust_decimal::Decimal;
use toll_model::{EventId, TagId, TxStatus};
use tracing::{info, warn};

/// Durable toll transaction ledger
pub struct TollLedger {
    storage: Storage,
}

impl TollLedger {
    /// Open or create the ledger
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self {
            storage: Storage::open(&config)?,
        })
    }

    /// Insert a new record. Returns `false` without writing when a record
    /// for the same event id already exists (idempotent no-op).
    pub fn insert_new(&self, tx: &TollTransaction) -> Result<bool> {
        if self.storage.exists(&tx.event_id)? {
            info!(event_id = %tx.event_id, "duplicate event, ledger insert skipped");
            return Ok(false);
        }
        self.storage.put(tx)?;
        info!(
            event_id = %tx.event_id,
            status = %tx.status,
            toll = %tx.toll_amount,
            "transaction recorded"
        );
        Ok(true)
    }

    /// Look up a record by event id
    pub fn get(&self, event_id: &EventId) -> Result<Option<TollTransaction>> {
        self.storage.get(event_id)
    }

    /// Whether a record exists for this event id
    pub fn exists(&self, event_id: &EventId) -> Result<bool> {
        self.storage.exists(event_id)
    }

    /// Move a record to a new status, updating balance bookkeeping.
    ///
    /// Rejects transitions that would leave a terminal status, keeping
    /// the record's history monotonic.
    pub fn finalize(
        &self,
        event_id: &EventId,
        status: TxStatus,
        new_balance: Option<Decimal>,
        manual_penalty_amount: Option<Decimal>,
    ) -> Result<TollTransaction> {
        let mut tx = self
            .storage
            .get(event_id)?
            .ok_or_else(|| Error::TransactionNotFound(event_id.to_string()))?;

        if !tx.status.can_transition_to(status) {
            warn!(
                event_id = %event_id,
                from = %tx.status,
                to = %status,
                "rejected non-monotonic status transition"
            );
            return Err(Error::InvalidTransition {
                from: tx.status,
                to: status,
            });
        }

        tx.status = status;
        if let Some(balance) = new_balance {
            tx.new_balance = balance;
        }
        if manual_penalty_amount.is_some() {
            tx.manual_penalty_amount = manual_penalty_amount;
        }

        self.storage.put(&tx)?;
        info!(
            event_id = %event_id,
            status = %tx.status,
            new_balance = %tx.new_balance,
            "transaction finalized"
        );
        Ok(tx)
    }

    /// All transactions recorded for a tag (audit/reconciliation)
    pub fn by_tag(&self, tag_id: &TagId) -> Result<Vec<TollTransaction>> {
        self.storage.scan_by_tag(tag_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use toll_model::VehicleType;

    fn test_ledger() -> (TollLedger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        (TollLedger::open(config).unwrap(), dir)
    }

    fn pending_tx(event_id: &str) -> TollTransaction {
        let now = Utc::now();
        TollTransaction {
            event_id: EventId::new(event_id),
            tag_id: TagId::new("T1"),
            vehicle_number: "MH01X0001".to_string(),
            vehicle_type: VehicleType::Light,
            plaza_id: "PLZ1".to_string(),
            lane_id: "L1".to_string(),
            toll_amount: dec!(30),
            previous_balance: dec!(500),
            new_balance: dec!(500),
            status: TxStatus::PendingPayment,
            manual_penalty_amount: None,
            created_at: now,
            timestamp: now,
        }
    }

    #[test]
    fn test_insert_is_idempotent_per_event_id() {
        let (ledger, _dir) = test_ledger();
        let tx = pending_tx("T1-100");

        assert!(ledger.insert_new(&tx).unwrap());
        assert!(!ledger.insert_new(&tx).unwrap());

        let stored = ledger.get(&tx.event_id).unwrap().unwrap();
        assert_eq!(stored.status, TxStatus::PendingPayment);
    }

    #[test]
    fn test_finalize_success_updates_balance() {
        let (ledger, _dir) = test_ledger();
        let tx = pending_tx("T1-100");
        ledger.insert_new(&tx).unwrap();

        let updated = ledger
            .finalize(&tx.event_id, TxStatus::Success, Some(dec!(470)), None)
            .unwrap();
        assert_eq!(updated.status, TxStatus::Success);
        assert_eq!(updated.new_balance, dec!(470));
        assert_eq!(updated.previous_balance, dec!(500));
    }

    #[test]
    fn test_terminal_status_never_reverts() {
        let (ledger, _dir) = test_ledger();
        let tx = pending_tx("T1-100");
        ledger.insert_new(&tx).unwrap();
        ledger
            .finalize(&tx.event_id, TxStatus::Success, Some(dec!(470)), None)
            .unwrap();

        let err = ledger
            .finalize(&tx.event_id, TxStatus::Failed, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let stored = ledger.get(&tx.event_id).unwrap().unwrap();
        assert_eq!(stored.status, TxStatus::Success);
        assert_eq!(stored.new_balance, dec!(470));
    }

    #[test]
    fn test_manual_collection_records_penalty() {
        let (ledger, _dir) = test_ledger();
        let tx = pending_tx("T1-100");
        ledger.insert_new(&tx).unwrap();
        ledger
            .finalize(&tx.event_id, TxStatus::Failed, Some(dec!(500)), None)
            .unwrap();

        let collected = ledger
            .finalize(
                &tx.event_id,
                TxStatus::ManualCollected,
                None,
                Some(dec!(60)),
            )
            .unwrap();
        assert_eq!(collected.status, TxStatus::ManualCollected);
        assert_eq!(collected.manual_penalty_amount, Some(dec!(60)));
        // Balance untouched by manual collection
        assert_eq!(collected.new_balance, dec!(500));
    }

    #[test]
    fn test_finalize_unknown_event_is_an_error() {
        let (ledger, _dir) = test_ledger();
        let err = ledger
            .finalize(&EventId::new("nope"), TxStatus::Success, None, None)
            .unwrap_err();
        assert!(matches!(err, Error::TransactionNotFound(_)));
    }

    #[test]
    fn test_by_tag_scan_returns_all_records() {
        let (ledger, _dir) = test_ledger();
        ledger.insert_new(&pending_tx("T1-100")).unwrap();
        ledger.insert_new(&pending_tx("T1-200")).unwrap();

        let txs = ledger.by_tag(&TagId::new("T1")).unwrap();
        assert_eq!(txs.len(), 2);
        assert!(ledger.by_tag(&TagId::new("T2")).unwrap().is_empty());
    }
}

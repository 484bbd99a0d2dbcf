//! Payment-result applier
//!
//! Sole balance mutator and sole writer of terminal ledger status. The
//! ledger is finalized before the cache is touched: a duplicate charge
//! response hits the monotonic-transition guard and becomes a no-op,
//! so the balance can never be deducted twice.

use crate::{
    cache::{BlacklistCache, TagCache},
    config::Config,
    Error, Result,
};
use async_trait::async_trait;
use message_bus::{Message, MessageBus, MessageHandler, PartitionKey, Topic};
use rust_decimal::Decimal;
use std::sync::Arc;
use toll_ledger::{TollLedger, TollTransaction};
use toll_model::{
    ChargeResponse, ChargeStatus, Decision, EventId, GateCommand, GateReason, TxStatus,
};
use tracing::{error, info, warn};

/// Finalizes transactions from `toll.charge.response` and handles
/// operator manual collection
pub struct PaymentResultApplier {
    ledger: Arc<TollLedger>,
    bus: Arc<MessageBus>,
    tag_cache: Arc<TagCache>,
    blacklist: Arc<BlacklistCache>,
    config: Config,
}

impl PaymentResultApplier {
    /// Wire up the applier
    pub fn new(
        ledger: Arc<TollLedger>,
        bus: Arc<MessageBus>,
        tag_cache: Arc<TagCache>,
        blacklist: Arc<BlacklistCache>,
        config: Config,
    ) -> Self {
        Self {
            ledger,
            bus,
            tag_cache,
            blacklist,
            config,
        }
    }

    /// Apply one charge response
    pub async fn apply(&self, response: &ChargeResponse) -> Result<()> {
        let Some(tx) = self.ledger.get(&response.event_id)? else {
            warn!(
                event_id = %response.event_id,
                "charge response for unknown transaction, ignored"
            );
            return Ok(());
        };

        // Finalizing without the cached account would leave cache and
        // ledger telling different balances. The record stays
        // PENDING_PAYMENT for the reconciliation sweep instead.
        if self.tag_cache.get(&tx.tag_id).is_none() {
            error!(
                event_id = %response.event_id,
                tag = %tx.tag_id,
                "cached account expired, charge response discarded"
            );
            return Ok(());
        }

        match response.status {
            ChargeStatus::Success => self.apply_success(&tx),
            ChargeStatus::Failed => self.apply_failure(&tx, response),
        }
    }

    fn apply_success(&self, tx: &TollTransaction) -> Result<()> {
        let new_balance = tx.previous_balance - tx.toll_amount;
        if !self.finalize(&tx.event_id, TxStatus::Success, Some(new_balance), None)? {
            return Ok(());
        }

        let cached = self.tag_cache.modify(&tx.tag_id, |acct| {
            acct.balance = new_balance;
            acct.current_trip = None;
        });
        if !cached {
            error!(
                tag = %tx.tag_id,
                "cache entry gone, deducted balance not applied locally"
            );
        }

        self.publish_gate(tx, tx.event_id.clone(), Decision::Open, GateReason::Paid)?;
        info!(
            event_id = %tx.event_id,
            new_balance = %new_balance,
            "payment confirmed"
        );
        Ok(())
    }

    fn apply_failure(&self, tx: &TollTransaction, response: &ChargeResponse) -> Result<()> {
        if !self.finalize(&tx.event_id, TxStatus::Failed, Some(tx.previous_balance), None)? {
            return Ok(());
        }

        self.tag_cache.modify(&tx.tag_id, |acct| {
            acct.current_trip = None;
        });
        self.blacklist
            .add(tx.tag_id.clone(), GateReason::PaymentFailed.code());

        self.publish_gate(
            tx,
            tx.event_id.clone(),
            Decision::Deny,
            GateReason::PaymentFailed,
        )?;
        warn!(
            event_id = %tx.event_id,
            reason = response.failure_reason.as_deref().unwrap_or("unknown"),
            "payment failed, tag blacklisted"
        );
        Ok(())
    }

    /// Operator collected the toll at the booth: penalty recorded, tag
    /// unblocked, gate opened. The prepaid balance stays untouched.
    pub async fn manual_collect(&self, event_id: &EventId) -> Result<TollTransaction> {
        let Some(tx) = self.ledger.get(event_id)? else {
            return Err(Error::TransactionNotFound(event_id.to_string()));
        };

        let penalty: Decimal = tx.toll_amount * self.config.penalty_multiplier;
        let finalized =
            self.ledger
                .finalize(event_id, TxStatus::ManualCollected, None, Some(penalty))?;

        self.blacklist.remove(&tx.tag_id);
        self.tag_cache.modify(&tx.tag_id, |acct| {
            acct.current_trip = None;
        });

        self.publish_gate(
            &tx,
            event_id.manual_companion(),
            Decision::Open,
            GateReason::ManualCollected,
        )?;
        info!(
            event_id = %event_id,
            penalty = %penalty,
            "manual collection recorded, tag unblocked"
        );
        Ok(finalized)
    }

    /// Finalize with the duplicate guard: a rejected transition means a
    /// duplicate delivery and is swallowed.
    fn finalize(
        &self,
        event_id: &EventId,
        status: TxStatus,
        new_balance: Option<Decimal>,
        penalty: Option<Decimal>,
    ) -> Result<bool> {
        match self.ledger.finalize(event_id, status, new_balance, penalty) {
            Ok(_) => Ok(true),
            Err(toll_ledger::Error::InvalidTransition { from, to }) => {
                info!(
                    event_id = %event_id,
                    %from,
                    %to,
                    "transaction already finalized, duplicate response ignored"
                );
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn publish_gate(
        &self,
        tx: &TollTransaction,
        event_id: EventId,
        decision: Decision,
        reason: GateReason,
    ) -> Result<()> {
        let command = GateCommand::new(event_id, tx.tag_id.clone(), tx.lane(), decision, reason);
        let message = Message::from_payload(
            Topic::GateCommand,
            PartitionKey::Lane {
                plaza_id: tx.plaza_id.clone(),
                lane_id: tx.lane_id.clone(),
            },
            &command,
        )?;
        self.bus.publish(&message)?;
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for PaymentResultApplier {
    async fn handle(&self, message: Message) -> message_bus::Result<()> {
        let response: ChargeResponse = message.payload_as()?;
        self.apply(&response)
            .await
            .map_err(|e| message_bus::Error::Handler(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::time::Duration;
    use toll_model::{TagAccount, TagId, VehicleType};

    struct Fixture {
        applier: PaymentResultApplier,
        bus: Arc<MessageBus>,
        ledger: Arc<TollLedger>,
        tag_cache: Arc<TagCache>,
        blacklist: Arc<BlacklistCache>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(
            TollLedger::open(toll_ledger::Config {
                data_dir: dir.path().to_path_buf(),
                ..Default::default()
            })
            .unwrap(),
        );
        let bus = Arc::new(MessageBus::new());
        let tag_cache = Arc::new(TagCache::new(Duration::from_secs(300)));
        let blacklist = Arc::new(BlacklistCache::new(Duration::from_secs(86400)));
        let applier = PaymentResultApplier::new(
            ledger.clone(),
            bus.clone(),
            tag_cache.clone(),
            blacklist.clone(),
            Config::default(),
        );
        Fixture {
            applier,
            bus,
            ledger,
            tag_cache,
            blacklist,
            _dir: dir,
        }
    }

    fn pending_tx(f: &Fixture, event_id: &str, balance: Decimal, toll: Decimal) {
        let now = chrono::Utc::now();
        f.ledger
            .insert_new(&TollTransaction {
                event_id: EventId::new(event_id),
                tag_id: TagId::new("T1"),
                vehicle_number: "VEH-T1".to_string(),
                vehicle_type: VehicleType::Light,
                plaza_id: "PLZ1".to_string(),
                lane_id: "L1".to_string(),
                toll_amount: toll,
                previous_balance: balance,
                new_balance: balance,
                status: TxStatus::PendingPayment,
                manual_penalty_amount: None,
                created_at: now,
                timestamp: now,
            })
            .unwrap();
        f.tag_cache.put(TagAccount {
            tag_id: TagId::new("T1"),
            vehicle_number: "VEH-T1".to_string(),
            vehicle_type: VehicleType::Light,
            balance,
            current_trip: None,
        });
    }

    fn success(event_id: &str) -> ChargeResponse {
        ChargeResponse {
            event_id: EventId::new(event_id),
            tag_id: TagId::new("T1"),
            status: ChargeStatus::Success,
            approval_code: Some("APP-1".to_string()),
            failure_reason: None,
        }
    }

    fn failure(event_id: &str) -> ChargeResponse {
        ChargeResponse {
            event_id: EventId::new(event_id),
            tag_id: TagId::new("T1"),
            status: ChargeStatus::Failed,
            approval_code: None,
            failure_reason: Some("Simulated gateway failure".to_string()),
        }
    }

    #[tokio::test]
    async fn test_success_deducts_balance_and_opens_gate() {
        let f = fixture();
        pending_tx(&f, "T1-100", dec!(500), dec!(30));
        let mut gates = f.bus.subscribe(Topic::GateCommand.name());

        f.applier.apply(&success("T1-100")).await.unwrap();

        let tx = f.ledger.get(&EventId::new("T1-100")).unwrap().unwrap();
        assert_eq!(tx.status, TxStatus::Success);
        assert_eq!(tx.new_balance, dec!(470));
        assert_eq!(f.tag_cache.get(&TagId::new("T1")).unwrap().balance, dec!(470));

        let gate: GateCommand = gates.recv().await.unwrap().payload_as().unwrap();
        assert_eq!(gate.decision, Decision::Open);
        assert_eq!(gate.reason, GateReason::Paid);
    }

    #[tokio::test]
    async fn test_duplicate_success_deducts_once() {
        let f = fixture();
        pending_tx(&f, "T1-100", dec!(500), dec!(30));
        let mut gates = f.bus.subscribe(Topic::GateCommand.name());

        f.applier.apply(&success("T1-100")).await.unwrap();
        f.applier.apply(&success("T1-100")).await.unwrap();

        assert_eq!(f.tag_cache.get(&TagId::new("T1")).unwrap().balance, dec!(470));
        gates.recv().await.unwrap();
        assert!(gates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_blacklists_and_keeps_balance() {
        let f = fixture();
        pending_tx(&f, "T1-100", dec!(500), dec!(30));
        let mut gates = f.bus.subscribe(Topic::GateCommand.name());

        f.applier.apply(&failure("T1-100")).await.unwrap();

        let tx = f.ledger.get(&EventId::new("T1-100")).unwrap().unwrap();
        assert_eq!(tx.status, TxStatus::Failed);
        assert_eq!(tx.new_balance, dec!(500));
        assert_eq!(f.tag_cache.get(&TagId::new("T1")).unwrap().balance, dec!(500));
        assert!(f.blacklist.is_blacklisted(&TagId::new("T1")));

        let gate: GateCommand = gates.recv().await.unwrap().payload_as().unwrap();
        assert_eq!(gate.decision, Decision::Deny);
        assert_eq!(gate.reason, GateReason::PaymentFailed);
    }

    #[tokio::test]
    async fn test_expired_cache_leaves_transaction_pending() {
        let f = fixture();
        pending_tx(&f, "T1-100", dec!(500), dec!(30));
        f.tag_cache.remove(&TagId::new("T1"));
        let mut gates = f.bus.subscribe(Topic::GateCommand.name());

        f.applier.apply(&success("T1-100")).await.unwrap();

        let tx = f.ledger.get(&EventId::new("T1-100")).unwrap().unwrap();
        assert_eq!(tx.status, TxStatus::PendingPayment);
        assert!(gates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_transaction_response_is_ignored() {
        let f = fixture();
        let mut gates = f.bus.subscribe(Topic::GateCommand.name());

        f.applier.apply(&success("T9-999")).await.unwrap();

        assert!(gates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_manual_collect_records_penalty_and_unblocks() {
        let f = fixture();
        pending_tx(&f, "T1-100", dec!(500), dec!(30));
        f.applier.apply(&failure("T1-100")).await.unwrap();
        assert!(f.blacklist.is_blacklisted(&TagId::new("T1")));
        let mut gates = f.bus.subscribe(Topic::GateCommand.name());

        let collected = f
            .applier
            .manual_collect(&EventId::new("T1-100"))
            .await
            .unwrap();
        assert_eq!(collected.status, TxStatus::ManualCollected);
        assert_eq!(collected.manual_penalty_amount, Some(dec!(60)));
        // Prepaid balance untouched by booth collection
        assert_eq!(collected.new_balance, dec!(500));
        assert!(!f.blacklist.is_blacklisted(&TagId::new("T1")));

        let gate: GateCommand = gates.recv().await.unwrap().payload_as().unwrap();
        assert_eq!(gate.decision, Decision::Open);
        assert_eq!(gate.reason, GateReason::ManualCollected);
        assert_eq!(gate.event_id.as_str(), "T1-100-MANUAL");
    }

    #[tokio::test]
    async fn test_manual_collect_unknown_event_is_an_error() {
        let f = fixture();
        let err = f
            .applier
            .manual_collect(&EventId::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TransactionNotFound(_)));
    }

    #[tokio::test]
    async fn test_manual_collect_after_success_is_rejected() {
        let f = fixture();
        pending_tx(&f, "T1-100", dec!(500), dec!(30));
        f.applier.apply(&success("T1-100")).await.unwrap();

        let err = f
            .applier
            .manual_collect(&EventId::new("T1-100"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(toll_ledger::Error::InvalidTransition { .. })
        ));
    }
}

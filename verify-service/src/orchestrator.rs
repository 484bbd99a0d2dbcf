//! Tag-read orchestrator
//!
//! Entry point of the saga. Each tag read is admitted (blacklist and
//! manual-flag check), priced, checked against the cached balance, and
//! recorded in the ledger before any message leaves the service:
//! outbound messages are staged and flushed only after the ledger
//! insert commits, and a duplicate insert drops the staged batch.
//!
//! The orchestrator never deducts balance. Deduction belongs to the
//! payment-result applier once the charge confirms.

use crate::{
    cache::{BlacklistCache, TagCache},
    config::{Config, GatePolicy},
    rates::RateTable,
    vendor::VendorDirectory,
    Result,
};
use async_trait::async_trait;
use chrono::Utc;
use message_bus::{Message, MessageBus, MessageHandler, PartitionKey, Topic};
use rust_decimal::Decimal;
use std::sync::Arc;
use toll_ledger::{TollLedger, TollTransaction};
use toll_model::{
    ChargeRequest, Decision, EventId, GateCommand, GateReason, TagAccount, TagReadEvent,
    TripStatus, TxStatus,
};
use tracing::{info, warn};

/// Admission verdict for a tag read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Eligible for automatic charging
    Automatic,
    /// Tag is blacklisted, toll collected at the booth
    ManualBlacklisted,
    /// Trip arrived flagged for manual handling
    ManualFlagged,
}

/// Saga orchestrator consuming `toll.tag.event`
pub struct TransactionOrchestrator {
    ledger: Arc<TollLedger>,
    bus: Arc<MessageBus>,
    tag_cache: Arc<TagCache>,
    blacklist: Arc<BlacklistCache>,
    vendor: Arc<dyn VendorDirectory>,
    rates: Arc<RateTable>,
    config: Config,
}

impl TransactionOrchestrator {
    /// Wire up the orchestrator
    pub fn new(
        ledger: Arc<TollLedger>,
        bus: Arc<MessageBus>,
        tag_cache: Arc<TagCache>,
        blacklist: Arc<BlacklistCache>,
        vendor: Arc<dyn VendorDirectory>,
        rates: Arc<RateTable>,
        config: Config,
    ) -> Self {
        Self {
            ledger,
            bus,
            tag_cache,
            blacklist,
            vendor,
            rates,
            config,
        }
    }

    /// Admission check: blacklist first, then the trip's own flag
    pub fn admit(&self, read: &TagReadEvent) -> Admission {
        if self.blacklist.is_blacklisted(&read.tag_id) {
            return Admission::ManualBlacklisted;
        }
        if read.trip.status == TripStatus::ManualRequired {
            return Admission::ManualFlagged;
        }
        Admission::Automatic
    }

    /// Process one tag read end to end
    pub async fn process(&self, read: &TagReadEvent) -> Result<()> {
        let event_id = EventId::derive(&read.tag_id, &read.trip.timestamp);

        if self.ledger.exists(&event_id)? {
            info!(event_id = %event_id, "duplicate tag read, skipped");
            return Ok(());
        }

        match self.admit(read) {
            Admission::Automatic => self.process_automatic(event_id, read).await,
            admission => self.process_manual(event_id, read, admission),
        }
    }

    async fn process_automatic(&self, event_id: EventId, read: &TagReadEvent) -> Result<()> {
        let Some(account) = self.resolve_account(read).await? else {
            warn!(tag = %read.tag_id, "unregistered tag, read dropped");
            return Ok(());
        };

        let Some(toll) = self.price(read) else {
            warn!(
                tag = %read.tag_id,
                lane = %read.trip.lane(),
                "no rate for lane, read dropped"
            );
            return Ok(());
        };

        if account.balance >= toll {
            self.open_pending(event_id, read, &account, toll)
        } else {
            self.deny_insufficient(event_id, read, &account, toll)
        }
    }

    /// Sufficient funds: record PENDING_PAYMENT, request the charge, and
    /// (optimistically) open the gate while the charge is in flight.
    fn open_pending(
        &self,
        event_id: EventId,
        read: &TagReadEvent,
        account: &TagAccount,
        toll: Decimal,
    ) -> Result<()> {
        let mut tx =
            TollTransaction::from_read(event_id.clone(), read, account.balance, TxStatus::PendingPayment);
        tx.toll_amount = toll;

        let mut outbox = vec![Message::from_payload(
            Topic::ChargeRequest,
            PartitionKey::Tag(read.tag_id.to_string()),
            &ChargeRequest {
                event_id: event_id.clone(),
                tag_id: read.tag_id.clone(),
                amount: toll,
                timestamp: Utc::now(),
            },
        )?];

        if self.config.gate_policy == GatePolicy::Optimistic {
            outbox.push(self.gate_message(
                &event_id,
                read,
                Decision::Open,
                GateReason::PaymentRequested,
            )?);
        }

        if !self.commit(&tx, outbox)? {
            return Ok(());
        }

        self.tag_cache.modify(&read.tag_id, |acct| {
            acct.current_trip = Some(read.trip.clone());
        });

        info!(
            event_id = %event_id,
            toll = %toll,
            balance = %account.balance,
            "charge requested"
        );
        Ok(())
    }

    /// Insufficient funds: terminal record, gate stays down.
    fn deny_insufficient(
        &self,
        event_id: EventId,
        read: &TagReadEvent,
        account: &TagAccount,
        toll: Decimal,
    ) -> Result<()> {
        let mut tx = TollTransaction::from_read(
            event_id.clone(),
            read,
            account.balance,
            TxStatus::InsufficientFunds,
        );
        tx.toll_amount = toll;

        let deny =
            self.gate_message(&event_id, read, Decision::Deny, GateReason::InsufficientFunds)?;
        if self.commit(&tx, vec![deny])? {
            warn!(
                event_id = %event_id,
                toll = %toll,
                balance = %account.balance,
                "insufficient funds, gate denied"
            );
        }
        Ok(())
    }

    /// Blacklisted or flagged read: record MANUAL_REQUIRED, deny the gate,
    /// wait for the operator.
    fn process_manual(
        &self,
        event_id: EventId,
        read: &TagReadEvent,
        admission: Admission,
    ) -> Result<()> {
        let balance = self
            .tag_cache
            .get(&read.tag_id)
            .map(|a| a.balance)
            .unwrap_or(Decimal::ZERO);
        // Booth collection charges toll plus penalty off this record,
        // so zero-toll reads get the rate-table price here too.
        let toll = self.price(read).unwrap_or_else(|| {
            warn!(
                tag = %read.tag_id,
                lane = %read.trip.lane(),
                "no rate for lane, manual toll recorded as zero"
            );
            Decimal::ZERO
        });
        let mut tx =
            TollTransaction::from_read(event_id.clone(), read, balance, TxStatus::ManualRequired);
        tx.toll_amount = toll;

        let deny = self.gate_message(&event_id, read, Decision::Deny, GateReason::ManualRequired)?;
        if self.commit(&tx, vec![deny])? {
            warn!(
                event_id = %event_id,
                tag = %read.tag_id,
                ?admission,
                "manual collection required, gate denied"
            );
        }
        Ok(())
    }

    /// Cache-or-vendor account resolution. A vendor hit is cached for
    /// subsequent reads of the same tag.
    async fn resolve_account(&self, read: &TagReadEvent) -> Result<Option<TagAccount>> {
        if let Some(account) = self.tag_cache.get(&read.tag_id) {
            return Ok(Some(account));
        }
        match self.vendor.fetch_account(&read.tag_id).await? {
            Some(account) => {
                self.tag_cache.put(account.clone());
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    /// Toll for this read: lane-priced amount, rate table as backstop
    /// for readers that publish a zero toll.
    fn price(&self, read: &TagReadEvent) -> Option<Decimal> {
        if read.trip.toll_amount > Decimal::ZERO {
            return Some(read.trip.toll_amount);
        }
        self.rates
            .rate(&read.trip.plaza_id, &read.trip.lane_id, read.vehicle_type)
    }

    fn gate_message(
        &self,
        event_id: &EventId,
        read: &TagReadEvent,
        decision: Decision,
        reason: GateReason,
    ) -> Result<Message> {
        let command = GateCommand::new(
            event_id.clone(),
            read.tag_id.clone(),
            read.trip.lane(),
            decision,
            reason,
        );
        Ok(Message::from_payload(
            Topic::GateCommand,
            PartitionKey::Lane {
                plaza_id: read.trip.plaza_id.clone(),
                lane_id: read.trip.lane_id.clone(),
            },
            &command,
        )?)
    }

    /// Publish-after-commit: insert the record, then flush the staged
    /// messages. A duplicate insert drops the batch so redelivery never
    /// double-publishes.
    fn commit(&self, tx: &TollTransaction, outbox: Vec<Message>) -> Result<bool> {
        if !self.ledger.insert_new(tx)? {
            return Ok(false);
        }
        for message in outbox {
            self.bus.publish(&message)?;
        }
        Ok(true)
    }
}

#[async_trait]
impl MessageHandler for TransactionOrchestrator {
    async fn handle(&self, message: Message) -> message_bus::Result<()> {
        let read: TagReadEvent = message.payload_as()?;
        self.process(&read)
            .await
            .map_err(|e| message_bus::Error::Handler(e.to_string()))
    }
}

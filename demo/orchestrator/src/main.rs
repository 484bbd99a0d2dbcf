//! Toll plaza demo
//!
//! Wires the full saga over the in-process bus and drives simulated
//! traffic through two plazas: a funded tag, an underfunded tag, a
//! blacklisted tag that ends in booth collection, and a redelivered
//! read that the idempotency checks absorb.
//!
//! Run with `RUST_LOG=info cargo run --bin toll-demo`. An optional TOML
//! config path may be passed as the first argument.

use gate_service::{GateActuator, GateStateStore, SimulatedBarrier};
use message_bus::{Consumer, DlqRouter, Message, MessageBus, PartitionKey, RetryPolicy, Topic};
use payment_service::{ChargeProcessor, SimulatedRail};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use toll_ledger::TollLedger;
use toll_model::{
    CurrentTrip, EventId, TagId, TagReadEvent, TripStatus, VehicleType,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use verify_service::{
    refresh_cached_tags, BlacklistCache, Config, DemoSeeder, PaymentResultApplier, RateTable,
    StaticVendorDirectory, TagCache, TransactionOrchestrator,
};

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
struct DemoConfig {
    verify: Config,
    gate: gate_service::Config,
    rail_failure_percent: u8,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            verify: Config::default(),
            gate: gate_service::Config::default(),
            rail_failure_percent: 10,
        }
    }
}

impl DemoConfig {
    fn load() -> anyhow::Result<Self> {
        match std::env::args().nth(1) {
            Some(path) => Ok(toml::from_str(&std::fs::read_to_string(path)?)?),
            None => Ok(Self::default()),
        }
    }
}

struct Rail {
    bus: Arc<MessageBus>,
    dlq: Arc<DlqRouter>,
    ledger: Arc<TollLedger>,
    seeder: DemoSeeder,
    applier: Arc<PaymentResultApplier>,
    gate_store: Arc<GateStateStore>,
    _data_dir: tempfile::TempDir,
}

fn start(demo: DemoConfig) -> anyhow::Result<Rail> {
    let data_dir = tempfile::tempdir()?;
    let bus = Arc::new(MessageBus::new());
    let dlq = Arc::new(DlqRouter::new(bus.clone()));
    let ledger = Arc::new(TollLedger::open(toll_ledger::Config {
        data_dir: data_dir.path().to_path_buf(),
        ..Default::default()
    })?);

    let config = demo.verify;
    let refresh_every = config.cache_ttl() / 2;
    let tag_cache = Arc::new(TagCache::new(config.cache_ttl()));
    let blacklist = Arc::new(BlacklistCache::new(config.blacklist_ttl()));
    let vendor = Arc::new(StaticVendorDirectory::new());
    let seeder = DemoSeeder::new(vendor.clone(), tag_cache.clone(), blacklist.clone());

    let orchestrator = Arc::new(TransactionOrchestrator::new(
        ledger.clone(),
        bus.clone(),
        tag_cache.clone(),
        blacklist.clone(),
        vendor.clone(),
        Arc::new(RateTable::with_defaults()),
        config.clone(),
    ));
    let processor = Arc::new(ChargeProcessor::new(
        Arc::new(SimulatedRail::new(demo.rail_failure_percent)),
        bus.clone(),
    ));
    let applier = Arc::new(PaymentResultApplier::new(
        ledger.clone(),
        bus.clone(),
        tag_cache.clone(),
        blacklist,
        config,
    ));
    let gate_store = Arc::new(GateStateStore::new());
    let actuator = Arc::new(GateActuator::new(
        Arc::new(SimulatedBarrier),
        gate_store.clone(),
        bus.clone(),
        demo.gate,
    ));

    Consumer::new(bus.clone(), dlq.clone(), Topic::TagEvent, RetryPolicy::default())
        .spawn(orchestrator);
    Consumer::new(bus.clone(), dlq.clone(), Topic::ChargeRequest, RetryPolicy::default())
        .spawn(processor);
    Consumer::new(bus.clone(), dlq.clone(), Topic::ChargeResponse, RetryPolicy::default())
        .spawn(applier.clone());
    Consumer::new(bus.clone(), dlq.clone(), Topic::GateCommand, RetryPolicy::default())
        .spawn(actuator);

    // Periodic vendor sweep keeps cached registration data warm
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(refresh_every);
        tick.tick().await;
        loop {
            tick.tick().await;
            if let Err(e) = refresh_cached_tags(vendor.as_ref(), &tag_cache).await {
                tracing::warn!("vendor refresh sweep failed: {e}");
            }
        }
    });

    Ok(Rail {
        bus,
        dlq,
        ledger,
        seeder,
        applier,
        gate_store,
        _data_dir: data_dir,
    })
}

fn tag_read(
    tag: &str,
    plaza: &str,
    lane: &str,
    vehicle_type: VehicleType,
    timestamp: &str,
) -> TagReadEvent {
    TagReadEvent {
        tag_id: TagId::new(tag),
        vehicle_number: format!("MH12-{}", tag),
        vehicle_type,
        trip: CurrentTrip {
            plaza_id: plaza.to_string(),
            lane_id: lane.to_string(),
            timestamp: timestamp.to_string(),
            // Priced by the rate table at the orchestrator
            toll_amount: dec!(0),
            status: TripStatus::Pending,
        },
    }
}

fn publish(rail: &Rail, read: &TagReadEvent) -> anyhow::Result<()> {
    let message = Message::from_payload(
        Topic::TagEvent,
        PartitionKey::Tag(read.tag_id.to_string()),
        read,
    )?;
    rail.bus.publish(&message)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rail = start(DemoConfig::load()?)?;

    info!("=== seeding demo tags ===");
    rail.seeder.seed_tag(TagId::new("T1042"), dec!(500));
    rail.seeder.seed_tag(TagId::new("T2077"), dec!(10));
    rail.seeder.seed_tag(TagId::new("T3001"), dec!(800));
    rail.seeder
        .blacklist(TagId::new("T3001"), "OPERATOR_HOLD");

    info!("=== scenario 1: funded tag, light vehicle ===");
    publish(
        &rail,
        &tag_read("T1042", "PLZ1", "L1", VehicleType::Light, "08:00:00"),
    )?;
    sleep(Duration::from_secs(1)).await;

    info!("=== scenario 2: underfunded tag, gate denied ===");
    publish(
        &rail,
        &tag_read("T2077", "PLZ1", "L1", VehicleType::Light, "08:00:05"),
    )?;
    sleep(Duration::from_secs(1)).await;

    info!("=== scenario 3: blacklisted tag, booth collection ===");
    let manual_read = tag_read("T3001", "PLZ6", "L9", VehicleType::Heavy, "08:00:10");
    publish(&rail, &manual_read)?;
    sleep(Duration::from_secs(1)).await;

    let manual_id = EventId::derive(&manual_read.tag_id, &manual_read.trip.timestamp);
    let collected = rail.applier.manual_collect(&manual_id).await?;
    info!(
        event_id = %manual_id,
        penalty = %collected.manual_penalty_amount.unwrap_or_default(),
        "operator collected at the booth"
    );

    info!("=== scenario 4: duplicate read delivery ===");
    publish(
        &rail,
        &tag_read("T1042", "PLZ1", "L1", VehicleType::Light, "08:00:00"),
    )?;

    // Let in-flight work and the gate open pulses drain
    sleep(Duration::from_secs(5)).await;

    info!("=== ledger ===");
    for tag in ["T1042", "T2077", "T3001"] {
        for tx in rail.ledger.by_tag(&TagId::new(tag))? {
            info!(
                event_id = %tx.event_id,
                status = %tx.status,
                toll = %tx.toll_amount,
                balance = %tx.new_balance,
                penalty = ?tx.manual_penalty_amount,
                "ledger record"
            );
        }
    }

    info!("=== lanes ===");
    for (plaza, lane) in [("PLZ1", "L1"), ("PLZ6", "L9")] {
        if let Some(state) = rail.gate_store.get(plaza, lane) {
            info!(
                lane = %format!("{}:{}", plaza, lane),
                opens = state.total_opens,
                denies = state.total_denies,
                last = %state.last_decision,
                reason = %state.last_reason,
                "lane state"
            );
        }
    }

    let stats = rail.dlq.stats();
    info!(dead_lettered = stats.total_entries, "demo complete");
    Ok(())
}

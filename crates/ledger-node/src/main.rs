//! Process bootstrap for the service-credit ledger node: load
//! configuration, initialize tracing, wire the Event Pipeline to the
//! Cluster Actor Registry to the Persistence Gateway, and run until
//! shutdown is requested.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ledger_actor::{ClusterRegistry, LocalSupervisor, StaticMembership};
use ledger_core::SystemClock;
use ledger_persistence::{ensure_schema, PersistenceGateway, PgLegacyStore, PgRelationalStore};
use ledger_pipeline::{InMemoryBus, MessageBus, Processor};
use ledger_types::NodeId;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// The service-credit ledger node.
#[derive(Parser, Debug)]
#[command(name = "ledger-node", version, about)]
struct Cli {
    /// Path to the node's TOML configuration file.
    #[arg(long, default_value = "ledger.toml")]
    config: PathBuf,

    /// Emit logs as JSON instead of human-readable text.
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = Arc::new(config::load(&cli.config)?);
    info!(?cli.config, idle_timeout_ms = config.idle_timeout_ms, "configuration loaded");

    let relational_pool = PgPoolOptions::new()
        .max_connections(config.relational.pool_size)
        .connect(&config.relational.url)
        .await?;
    ensure_schema(&relational_pool).await?;
    let relational = Arc::new(PgRelationalStore::new(relational_pool));

    let gateway = if config.document.url.is_empty() {
        info!("no legacy database configured, running relational-only");
        PersistenceGateway::relational_only(relational)
    } else {
        let legacy_pool = PgPoolOptions::new()
            .max_connections(config.document.pool_size)
            .connect(&config.document.url)
            .await?;
        let legacy = Arc::new(PgLegacyStore::new(legacy_pool));
        PersistenceGateway::with_legacy(relational, legacy, config.pipeline.processor_max_demand, 3)
    };

    let local_node = NodeId::new();
    let local = Arc::new(LocalSupervisor::new(Arc::new(gateway), Arc::new(SystemClock), config.clone()));

    // Cross-node RPC dispatch and a production membership/discovery
    // collaborator are out of scope (§1); this node always runs as the
    // sole member of its own cluster view.
    let registry = Arc::new(ClusterRegistry::new(local_node, local, Arc::new(StaticMembership::single(local_node))));

    // No production bus client (NATS/Kafka/SQS) ships with this crate —
    // it is the pluggable external collaborator the spec calls out. The
    // in-memory bus lets the wiring below run end to end, but nothing
    // will arrive on it outside of embedding code that publishes to it.
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new(config.pipeline.processor_max_demand));
    warn!("no production message bus client configured; running with the in-memory bus");

    let processor = Arc::new(Processor::new(registry.clone()));

    let mut workers = Vec::new();
    for id in 0..config.pipeline.processor_concurrency {
        let bus = bus.clone();
        let processor = processor.clone();
        workers.push(tokio::spawn(async move {
            while let Some(envelope) = bus.next().await {
                processor.process(envelope).await;
            }
            info!(worker = id, "processor worker exiting, bus closed");
        }));
    }

    info!(workers = workers.len(), "event pipeline running");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    for worker in workers {
        worker.abort();
    }

    Ok(())
}

//! `strata-server`: wires a local backend, the in-memory metadata store,
//! and the built-in action registry into an engine, then serves the admin
//! API over HTTP.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use strata_action::ActionRegistry;
use strata_engine::{Engine, EngineConfig};
use strata_meta::{MemMetaStore, MetaStore};
use strata_server::{router, AppState};
use strata_store::{LocalBackend, StorageBackend};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "strata-server", about = "Storage-policy execution engine")]
struct Args {
    /// Address to serve the admin API on
    #[arg(long, default_value = "127.0.0.1:7878")]
    bind: String,

    /// Root directory of the storage backend
    #[arg(long, default_value = "./strata-data")]
    root: PathBuf,

    /// Executor pool size
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Dispatch queue capacity
    #[arg(long, default_value_t = 1024)]
    queue_capacity: usize,

    /// Safe-mode readiness poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    safemode_poll_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let storage = Arc::new(
        LocalBackend::new(args.root.clone())
            .with_context(|| format!("creating storage root {}", args.root.display()))?,
    );
    let meta = Arc::new(MemMetaStore::new());

    let config = EngineConfig {
        workers: args.workers,
        queue_capacity: args.queue_capacity,
        safemode_poll: Duration::from_millis(args.safemode_poll_ms),
    };
    let engine = Engine::start(
        config,
        storage as Arc<dyn StorageBackend>,
        meta as Arc<dyn MetaStore>,
        ActionRegistry::builtin(),
    )
    .context("starting engine")?;

    let app = router(AppState::new(Arc::new(engine)));
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    tracing::info!(bind = %args.bind, "strata server listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}

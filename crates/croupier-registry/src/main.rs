//! Croupier Registry Server
//!
//! HTTP registry where casinos register, heartbeat and publish metadata.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use croupier_core::config::{Config, default_database_path, load_config};
use croupier_core::tracing_init::init_tracing;
use croupier_registry::api::{AppState, build_router};
use croupier_registry::storage::{MemoryStore, RegistryDatabase, SharedStore};
use croupier_registry::sweeper::Sweeper;

#[derive(Parser, Debug)]
#[command(name = "croupier-registry")]
#[command(
    version,
    about = "Croupier registry server - signed casino registration, heartbeats and discovery"
)]
struct Args {
    /// Path to a JSON settings file.
    #[arg(long, env = "CROUPIER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Keep all state in memory (lost on exit).
    #[arg(long)]
    in_memory: bool,

    /// Inactivity timeout in seconds before a casino is marked offline.
    #[arg(long)]
    inactivity_timeout: Option<u64>,

    /// Disable the inactivity sweeper.
    #[arg(long)]
    no_sweeper: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(path) = &self.db_path {
            config.server.database_path = Some(path.clone());
        }
        if let Some(secs) = self.inactivity_timeout {
            config.sweeper.inactivity_timeout_secs = secs;
        }
        config.server.in_memory |= self.in_memory;
        config.server.log_json |= self.log_json;
        if self.no_sweeper {
            config.sweeper.enabled = false;
        }
    }
}

async fn open_store(config: &Config) -> anyhow::Result<SharedStore> {
    if config.server.in_memory {
        info!("Using in-memory store; state is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = config
        .server
        .database_path
        .clone()
        .or_else(default_database_path)
        .ok_or_else(|| anyhow::anyhow!("Cannot determine database path; pass --db-path"))?;
    info!(path = %path.display(), "Opening registry database");
    Ok(Arc::new(RegistryDatabase::open(&path).await?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);

    init_tracing("croupier_registry=info,tower_http=info", config.server.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        "Starting croupier-registry"
    );

    let store = open_store(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = if config.sweeper.enabled {
        Some(Sweeper::new(Arc::clone(&store), &config.sweeper).spawn(shutdown_rx))
    } else {
        info!("Inactivity sweeper disabled");
        None
    };

    let state = Arc::new(AppState::new(store, &config.registry));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    info!(addr = %config.server.addr, "Registry listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            error!(error = %e, "Sweeper task panicked");
        }
    }

    info!("Registry stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

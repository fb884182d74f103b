//! Subcommands and their execution.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{info, warn};

use croupier_crypto::CasinoKeyPair;
use croupier_registry::types::{CasinoStatus, GameType, HeartbeatMetrics};

use crate::client::{CasinoChanges, ListFilter, Registration, RegistryClient};
use crate::fmt;

/// Location of the signing key when `--key` is not given.
pub fn default_key_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("croupier").join("casino.key"))
}

#[derive(clap::Args, Debug, Clone)]
pub struct KeyArgs {
    /// Path to the casino's secret key (defaults to ~/.config/croupier/casino.key).
    #[arg(long, env = "CROUPIER_KEY")]
    pub key: Option<PathBuf>,
}

impl KeyArgs {
    pub fn path(&self) -> anyhow::Result<PathBuf> {
        self.key
            .clone()
            .or_else(default_key_path)
            .ok_or_else(|| anyhow::anyhow!("No key path given and no config directory found"))
    }

    pub fn load(&self) -> anyhow::Result<CasinoKeyPair> {
        let path = self.path()?;
        CasinoKeyPair::load_from_file(&path)
            .with_context(|| format!("Failed to load key from {}", path.display()))
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Generate a new casino signing key.
    Keygen {
        #[command(flatten)]
        key: KeyArgs,
        /// Overwrite an existing key file.
        #[arg(long)]
        force: bool,
    },
    /// Register this casino with the registry.
    Register {
        #[command(flatten)]
        key: KeyArgs,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        /// Comma-separated game tags (e.g. slots,dice).
        #[arg(long, value_delimiter = ',')]
        games: Vec<GameType>,
        /// Comma-separated token symbols.
        #[arg(long, value_delimiter = ',')]
        tokens: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Send signed heartbeats until interrupted.
    Heartbeat {
        #[command(flatten)]
        key: KeyArgs,
        #[arg(long)]
        casino_id: String,
        #[arg(long, default_value = "online")]
        status: CasinoStatus,
        /// Seconds between heartbeats until the registry suggests otherwise.
        #[arg(long, default_value_t = 60)]
        interval: u64,
        /// Reported player count.
        #[arg(long)]
        active_players: Option<u64>,
        /// Send a single heartbeat and exit.
        #[arg(long)]
        once: bool,
    },
    /// Change a registered casino's details.
    Update {
        #[command(flatten)]
        key: KeyArgs,
        #[arg(long)]
        casino_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        status: Option<CasinoStatus>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List registered casinos.
    List {
        #[arg(long)]
        status: Option<CasinoStatus>,
        #[arg(long, value_delimiter = ',')]
        games: Vec<GameType>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Show one casino by id, or by public key with --by-key.
    Show {
        id: String,
        #[arg(long)]
        by_key: bool,
        /// Also print the most recent heartbeats.
        #[arg(long)]
        history: bool,
    },
    /// Show network statistics.
    Stats,
}

/// Execute a subcommand against the registry at `server`.
pub async fn run(command: Command, server: &str) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match command {
        Command::Keygen { key, force } => keygen(&key.path()?, force, &mut out),
        Command::Register {
            key,
            name,
            url,
            games,
            tokens,
            description,
        } => {
            let client = RegistryClient::new(server)?;
            let registration = Registration {
                name,
                url,
                description,
                games,
                tokens,
            };
            let casino = client.register(&key.load()?, &registration).await?;
            info!(casino_id = %casino.id, "Casino registered");
            writeln!(out, "Registered casino {}", casino.id)?;
            write!(out, "{}", fmt::format_casino(&casino))?;
            Ok(())
        }
        Command::Heartbeat {
            key,
            casino_id,
            status,
            interval,
            active_players,
            once,
        } => {
            let client = RegistryClient::new(server)?;
            let pulse = Pulse {
                casino_id,
                status,
                interval: Duration::from_secs(interval.max(1)),
                active_players,
                once,
            };
            heartbeat_loop(&client, &key.load()?, &pulse).await
        }
        Command::Update {
            key,
            casino_id,
            name,
            url,
            status,
            description,
        } => {
            let changes = CasinoChanges {
                name,
                url,
                status,
                description,
            };
            if changes.name.is_none()
                && changes.url.is_none()
                && changes.status.is_none()
                && changes.description.is_none()
            {
                anyhow::bail!(
                    "Nothing to update: pass --name, --url, --status or --description"
                );
            }
            let client = RegistryClient::new(server)?;
            let casino = client.update(&key.load()?, &casino_id, &changes).await?;
            write!(out, "{}", fmt::format_casino(&casino))?;
            Ok(())
        }
        Command::List {
            status,
            games,
            limit,
            offset,
        } => {
            let client = RegistryClient::new(server)?;
            let filter = ListFilter {
                status,
                games,
                limit,
                offset,
            };
            let list = client.list(&filter).await?;
            write!(out, "{}", fmt::format_casino_list(&list))?;
            Ok(())
        }
        Command::Show {
            id,
            by_key,
            history,
        } => {
            let client = RegistryClient::new(server)?;
            let casino = if by_key {
                client.get_by_public_key(&id).await?
            } else {
                client.get_casino(&id).await?
            };
            write!(out, "{}", fmt::format_casino(&casino))?;
            if history {
                let beats = client.heartbeats(&casino.id, Some(10)).await?;
                writeln!(out)?;
                write!(out, "{}", fmt::format_heartbeats(&beats))?;
            }
            Ok(())
        }
        Command::Stats => {
            let client = RegistryClient::new(server)?;
            let stats = client.stats().await?;
            write!(out, "{}", fmt::format_stats(&stats))?;
            Ok(())
        }
    }
}

/// Write a fresh key to `path` and print its public half.
pub fn keygen(path: &Path, force: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Key file {} already exists (use --force to replace it)",
            path.display()
        );
    }
    let key = CasinoKeyPair::generate();
    key.save_to_file(path)
        .with_context(|| format!("Failed to write key to {}", path.display()))?;
    info!(path = %path.display(), "Generated signing key");
    writeln!(out, "Key written to {}", path.display())?;
    writeln!(out, "Public key: {}", key.public_key_base58())?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Pulse {
    casino_id: String,
    status: CasinoStatus,
    interval: Duration,
    active_players: Option<u64>,
    once: bool,
}

/// Heartbeat until Ctrl+C, or once with `--once`.
///
/// Transient failures are logged and retried on the next beat; rejections
/// the registry will keep making (bad signature, unknown casino) end the loop.
async fn heartbeat_loop(
    client: &RegistryClient,
    key: &CasinoKeyPair,
    pulse: &Pulse,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let mut wait = pulse.interval;

    loop {
        let metrics = HeartbeatMetrics {
            active_players: pulse.active_players,
            uptime_secs: Some(started.elapsed().as_secs()),
            ..HeartbeatMetrics::default()
        };
        match client
            .heartbeat(key, &pulse.casino_id, pulse.status, Some(&metrics))
            .await
        {
            Ok(ack) => {
                info!(
                    casino_id = %pulse.casino_id,
                    status = %pulse.status,
                    server_time = ack.server_time,
                    next_in_secs = ack.next_heartbeat_in_secs,
                    "Heartbeat acknowledged"
                );
                if pulse.once {
                    return Ok(());
                }
                wait = next_wait(pulse.interval, ack.next_heartbeat_in_secs);
            }
            Err(e) if pulse.once || !e.is_retryable() => return Err(e.into()),
            Err(e) => warn!(error = %e, "Heartbeat failed, retrying"),
        }

        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping heartbeats");
                return Ok(());
            }
        }
    }
}

/// The registry's suggestion wins when it gives one.
fn next_wait(fallback: Duration, suggested_secs: u64) -> Duration {
    if suggested_secs == 0 {
        fallback
    } else {
        Duration::from_secs(suggested_secs)
    }
}

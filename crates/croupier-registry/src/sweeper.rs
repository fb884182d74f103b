//! Inactivity sweeper: demotes casinos that stopped heartbeating.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use croupier_core::config::SweeperConfig;
use croupier_core::db::{DatabaseError, unix_timestamp};

use crate::storage::{RegistryStore, SharedStore};

/// Move every casino not seen within `timeout` of `now` to `offline`.
///
/// Casinos already offline are left alone and not counted. Returns the
/// number of casinos transitioned.
pub async fn sweep_inactive(
    store: &dyn RegistryStore,
    timeout: Duration,
    now: i64,
) -> Result<u64, DatabaseError> {
    let timeout = i64::try_from(timeout.as_secs()).unwrap_or(i64::MAX);
    store.mark_inactive(now.saturating_sub(timeout), now).await
}

pub struct Sweeper {
    store: SharedStore,
    interval: Duration,
    timeout: Duration,
}

impl Sweeper {
    pub fn new(store: SharedStore, config: &SweeperConfig) -> Self {
        Self {
            store,
            interval: Duration::from_secs(config.interval_secs.max(1)),
            timeout: Duration::from_secs(config.inactivity_timeout_secs),
        }
    }

    /// Run the sweep on a fixed interval until `shutdown` changes.
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(self.interval);
            timer.tick().await; // Skip first immediate tick

            info!(
                interval_secs = self.interval.as_secs(),
                timeout_secs = self.timeout.as_secs(),
                "Inactivity sweeper started"
            );

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        match sweep_inactive(self.store.as_ref(), self.timeout, unix_timestamp()).await {
                            Ok(0) => debug!("Sweep found no inactive casinos"),
                            Ok(count) => info!(count, "Marked inactive casinos offline"),
                            Err(e) => error!(error = %e, "Inactivity sweep failed"),
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("Inactivity sweeper shutting down");
                        return;
                    }
                }
            }
        })
    }
}

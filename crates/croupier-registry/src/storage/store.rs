//! The store capability injected into every protocol and query.

use std::sync::Arc;

use async_trait::async_trait;

use croupier_core::db::DatabaseError;

use crate::types::{
    Casino, CasinoMetadata, CasinoStatus, GameType, Heartbeat, HeartbeatMetrics, MetadataPatch,
};

pub type SharedStore = Arc<dyn RegistryStore>;

/// Fields of a casino about to be created. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewCasino {
    pub name: String,
    pub url: String,
    pub public_key: String,
    pub status: CasinoStatus,
    pub metadata: CasinoMetadata,
    pub protocol_version: String,
    pub created_at: i64,
}

/// A heartbeat about to be appended. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewHeartbeat {
    pub casino_id: String,
    pub status: CasinoStatus,
    pub metrics: Option<HeartbeatMetrics>,
    pub signature: String,
    pub observed_at: i64,
}

/// Field-wise change to an existing casino. `None` leaves the stored value.
#[derive(Debug, Clone, Default)]
pub struct CasinoPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub status: Option<CasinoStatus>,
    pub metadata: Option<MetadataPatch>,
}

impl CasinoPatch {
    /// Apply the present fields to `casino` and stamp `updated_at`.
    pub fn apply_to(&self, casino: &mut Casino, now: i64) {
        if let Some(name) = &self.name {
            casino.name.clone_from(name);
        }
        if let Some(url) = &self.url {
            casino.url.clone_from(url);
        }
        if let Some(status) = self.status {
            casino.status = status;
        }
        if let Some(metadata) = &self.metadata {
            casino.metadata = metadata.apply_to(&casino.metadata);
        }
        casino.updated_at = now;
    }
}

/// Discovery filter. `games` matches on any overlap; empty means no filter.
#[derive(Debug, Clone, Default)]
pub struct CasinoFilter {
    pub status: Option<CasinoStatus>,
    pub games: Vec<GameType>,
    pub limit: u32,
    pub offset: u32,
}

/// One page of a filtered listing plus the total number of matches.
#[derive(Debug, Clone)]
pub struct CasinoPage {
    pub casinos: Vec<Casino>,
    pub total: u64,
}

/// Persistence contract for the registry.
///
/// `create_casino` must reject a duplicate `public_key` atomically with
/// [`DatabaseError::AlreadyExists`], even when two creates race.
/// Listings are ordered by `last_seen_at` descending with never-seen casinos
/// last, then `created_at` descending, then `id`.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn create_casino(&self, casino: NewCasino) -> Result<Casino, DatabaseError>;

    async fn find_casino(&self, id: &str) -> Result<Option<Casino>, DatabaseError>;

    async fn find_casino_by_public_key(
        &self,
        public_key: &str,
    ) -> Result<Option<Casino>, DatabaseError>;

    /// Write only the fields `patch` carries, in one atomic step, and return
    /// the stored result. `Ok(None)` when the casino does not exist.
    ///
    /// Fields the patch leaves out keep whatever a concurrent heartbeat or
    /// sweep wrote.
    async fn update_casino(
        &self,
        id: &str,
        patch: &CasinoPatch,
        now: i64,
    ) -> Result<Option<Casino>, DatabaseError>;

    async fn list_casinos(&self, filter: &CasinoFilter) -> Result<CasinoPage, DatabaseError>;

    async fn count_casinos(&self, status: Option<CasinoStatus>) -> Result<u64, DatabaseError>;

    /// Append `heartbeat` and apply it to its casino (`status`,
    /// `last_seen_at` and `updated_at` from `observed_at`) atomically.
    ///
    /// An unknown casino is [`DatabaseError::NotFound`] and nothing is written.
    async fn record_heartbeat(&self, heartbeat: NewHeartbeat) -> Result<Heartbeat, DatabaseError>;

    /// Most recent heartbeats of one casino, newest first.
    async fn list_heartbeats(
        &self,
        casino_id: &str,
        limit: u32,
    ) -> Result<Vec<Heartbeat>, DatabaseError>;

    async fn count_heartbeats_since(&self, since: i64) -> Result<u64, DatabaseError>;

    /// Move every non-offline casino last seen before `cutoff` to `offline`.
    ///
    /// Casinos that never sent a heartbeat are judged by `created_at`.
    /// Returns how many casinos changed status.
    async fn mark_inactive(&self, cutoff: i64, now: i64) -> Result<u64, DatabaseError>;

    /// One cheap round-trip, used by the readiness check.
    async fn ping(&self) -> Result<(), DatabaseError>;
}

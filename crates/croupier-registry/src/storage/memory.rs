//! In-memory [`RegistryStore`].
//!
//! All state sits behind one `RwLock`. Every write, including the public-key
//! index check and the heartbeat append plus touch, happens under a single
//! write guard.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use croupier_core::db::DatabaseError;

use super::store::{
    CasinoFilter, CasinoPage, CasinoPatch, NewCasino, NewHeartbeat, RegistryStore,
};
use crate::types::{Casino, CasinoStatus, Heartbeat};

#[derive(Default)]
struct State {
    casinos: HashMap<String, Casino>,
    by_public_key: HashMap<String, String>,
    heartbeats: Vec<Heartbeat>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn discovery_order(a: &Casino, b: &Casino) -> Ordering {
    a.last_seen_at
        .is_none()
        .cmp(&b.last_seen_at.is_none())
        .then_with(|| b.last_seen_at.cmp(&a.last_seen_at))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn matches(casino: &Casino, filter: &CasinoFilter) -> bool {
    filter.status.is_none_or(|status| casino.status == status)
        && (filter.games.is_empty()
            || casino
                .metadata
                .games
                .iter()
                .any(|game| filter.games.contains(game)))
}

fn not_found(id: &str) -> DatabaseError {
    DatabaseError::NotFound(format!("Casino {id}"))
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn create_casino(&self, casino: NewCasino) -> Result<Casino, DatabaseError> {
        let mut state = self.state.write().await;
        if state.by_public_key.contains_key(&casino.public_key) {
            return Err(DatabaseError::AlreadyExists(format!(
                "Casino with public key {}",
                casino.public_key
            )));
        }

        let created = Casino {
            id: uuid::Uuid::new_v4().to_string(),
            name: casino.name,
            url: casino.url,
            public_key: casino.public_key,
            status: casino.status,
            metadata: casino.metadata,
            protocol_version: casino.protocol_version,
            created_at: casino.created_at,
            updated_at: casino.created_at,
            last_seen_at: None,
        };
        state
            .by_public_key
            .insert(created.public_key.clone(), created.id.clone());
        state.casinos.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn find_casino(&self, id: &str) -> Result<Option<Casino>, DatabaseError> {
        Ok(self.state.read().await.casinos.get(id).cloned())
    }

    async fn find_casino_by_public_key(
        &self,
        public_key: &str,
    ) -> Result<Option<Casino>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .by_public_key
            .get(public_key)
            .and_then(|id| state.casinos.get(id))
            .cloned())
    }

    async fn update_casino(
        &self,
        id: &str,
        patch: &CasinoPatch,
        now: i64,
    ) -> Result<Option<Casino>, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(state.casinos.get_mut(id).map(|stored| {
            patch.apply_to(stored, now);
            stored.clone()
        }))
    }

    async fn list_casinos(&self, filter: &CasinoFilter) -> Result<CasinoPage, DatabaseError> {
        let state = self.state.read().await;
        let mut matching: Vec<&Casino> = state
            .casinos
            .values()
            .filter(|casino| matches(casino, filter))
            .collect();
        matching.sort_by(|a, b| discovery_order(a, b));

        let total = matching.len() as u64;
        let casinos = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok(CasinoPage { casinos, total })
    }

    async fn count_casinos(&self, status: Option<CasinoStatus>) -> Result<u64, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .casinos
            .values()
            .filter(|casino| status.is_none_or(|s| casino.status == s))
            .count() as u64)
    }

    async fn record_heartbeat(&self, heartbeat: NewHeartbeat) -> Result<Heartbeat, DatabaseError> {
        let mut state = self.state.write().await;
        let casino = state
            .casinos
            .get_mut(&heartbeat.casino_id)
            .ok_or_else(|| not_found(&heartbeat.casino_id))?;
        casino.status = heartbeat.status;
        casino.last_seen_at = Some(heartbeat.observed_at);
        casino.updated_at = heartbeat.observed_at;

        let recorded = Heartbeat {
            id: uuid::Uuid::new_v4().to_string(),
            casino_id: heartbeat.casino_id,
            status: heartbeat.status,
            metrics: heartbeat.metrics,
            signature: heartbeat.signature,
            observed_at: heartbeat.observed_at,
        };
        state.heartbeats.push(recorded.clone());
        Ok(recorded)
    }

    async fn list_heartbeats(
        &self,
        casino_id: &str,
        limit: u32,
    ) -> Result<Vec<Heartbeat>, DatabaseError> {
        let state = self.state.read().await;
        let mut heartbeats: Vec<Heartbeat> = state
            .heartbeats
            .iter()
            .rev()
            .filter(|hb| hb.casino_id == casino_id)
            .cloned()
            .collect();
        // Stable sort keeps newest-inserted first among equal timestamps.
        heartbeats.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
        heartbeats.truncate(limit as usize);
        Ok(heartbeats)
    }

    async fn count_heartbeats_since(&self, since: i64) -> Result<u64, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .heartbeats
            .iter()
            .filter(|hb| hb.observed_at >= since)
            .count() as u64)
    }

    async fn mark_inactive(&self, cutoff: i64, now: i64) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        let mut changed = 0;
        for casino in state.casinos.values_mut() {
            let seen = casino.last_seen_at.unwrap_or(casino.created_at);
            if casino.status != CasinoStatus::Offline && seen < cutoff {
                casino.status = CasinoStatus::Offline;
                casino.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

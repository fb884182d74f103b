//! Unauthenticated reads: filtered listing, point lookups and statistics.

use serde::{Deserialize, Serialize};

use croupier_core::config::RegistryConfig;
use croupier_core::db::unix_timestamp;

use crate::protocol::ProtocolError;
use crate::storage::{CasinoFilter, SharedStore};
use crate::types::{Casino, CasinoStatus, GameType, Heartbeat, NetworkStats, PROTOCOL_VERSION};

const STATS_WINDOW_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub status: Option<CasinoStatus>,
    /// Match casinos offering any of these games.
    pub games: Vec<GameType>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasinoList {
    pub casinos: Vec<Casino>,
    /// Matches across all pages.
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

pub struct DiscoveryService {
    store: SharedStore,
    default_page_size: u32,
    max_page_size: u32,
}

impl DiscoveryService {
    pub fn new(store: SharedStore, config: &RegistryConfig) -> Self {
        Self {
            store,
            default_page_size: config.default_page_size.max(1),
            max_page_size: config.max_page_size.max(1),
        }
    }

    /// Absent or zero picks the default page size; anything above the
    /// maximum is clamped.
    fn effective_limit(&self, limit: Option<u32>) -> u32 {
        match limit {
            None | Some(0) => self.default_page_size.min(self.max_page_size),
            Some(n) => n.min(self.max_page_size),
        }
    }

    pub async fn list(&self, query: ListQuery) -> Result<CasinoList, ProtocolError> {
        let limit = self.effective_limit(query.limit);
        let offset = query.offset.unwrap_or(0);
        let page = self
            .store
            .list_casinos(&CasinoFilter {
                status: query.status,
                games: query.games,
                limit,
                offset,
            })
            .await?;

        Ok(CasinoList {
            casinos: page.casinos,
            total: page.total,
            limit,
            offset,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Casino, ProtocolError> {
        self.store
            .find_casino(id)
            .await?
            .ok_or_else(|| ProtocolError::NotFound(id.to_string()))
    }

    pub async fn get_by_public_key(&self, public_key: &str) -> Result<Casino, ProtocolError> {
        self.store
            .find_casino_by_public_key(public_key)
            .await?
            .ok_or_else(|| ProtocolError::NotFound(public_key.to_string()))
    }

    /// Heartbeat history of one casino, newest first.
    pub async fn heartbeats(
        &self,
        id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Heartbeat>, ProtocolError> {
        let casino = self.get(id).await?;
        let limit = self.effective_limit(limit);
        Ok(self.store.list_heartbeats(&casino.id, limit).await?)
    }

    /// Live aggregate counts; no snapshot consistency across the three.
    pub async fn stats(&self) -> Result<NetworkStats, ProtocolError> {
        let since = unix_timestamp() - STATS_WINDOW_SECS;
        Ok(NetworkStats {
            total_casinos: self.store.count_casinos(None).await?,
            online_casinos: self.store.count_casinos(Some(CasinoStatus::Online)).await?,
            heartbeats_last_24h: self.store.count_heartbeats_since(since).await?,
            protocol_version: PROTOCOL_VERSION.to_string(),
        })
    }
}

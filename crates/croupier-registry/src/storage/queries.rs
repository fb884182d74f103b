//! `SQLite` implementation of [`RegistryStore`].

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use croupier_core::db::DatabaseError;

use super::db::RegistryDatabase;
use super::models::{CasinoRow, HeartbeatRow};
use super::store::{
    CasinoFilter, CasinoPage, CasinoPatch, NewCasino, NewHeartbeat, RegistryStore,
};
use crate::types::{Casino, CasinoStatus, Heartbeat};

const DISCOVERY_ORDER: &str =
    " ORDER BY last_seen_at IS NULL, last_seen_at DESC, created_at DESC, id ASC";

/// Absent fields fall back to the stored column; metadata is merged with
/// `json_patch` after an optional wholesale `socialLinks` replacement.
const UPDATE_CASINO_SQL: &str = "UPDATE casinos SET \
    name = COALESCE(?, name), \
    url = COALESCE(?, url), \
    status = COALESCE(?, status), \
    metadata = json_patch(\
        CASE WHEN ? IS NULL THEN metadata \
        ELSE json_set(metadata, '$.socialLinks', json(?)) END, ?), \
    updated_at = ? \
    WHERE id = ?";

fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &CasinoFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if !filter.games.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM json_each(casinos.metadata, '$.games') \
             WHERE json_each.value IN (",
        );
        let mut games = qb.separated(", ");
        for game in &filter.games {
            games.push_bind(game.as_str());
        }
        games.push_unseparated("))");
    }
}

impl RegistryDatabase {
    async fn fetch_casino(&self, sql: &str, value: &str) -> Result<Option<Casino>, DatabaseError> {
        let row = sqlx::query_as::<_, CasinoRow>(sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await?;
        row.map(Casino::try_from).transpose()
    }
}

#[async_trait]
impl RegistryStore for RegistryDatabase {
    async fn create_casino(&self, casino: NewCasino) -> Result<Casino, DatabaseError> {
        let id = uuid::Uuid::new_v4().to_string();
        let metadata = serde_json::to_string(&casino.metadata)?;

        sqlx::query(
            "INSERT INTO casinos (id, name, url, public_key, status, metadata, protocol_version, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&casino.name)
        .bind(&casino.url)
        .bind(&casino.public_key)
        .bind(casino.status.as_str())
        .bind(&metadata)
        .bind(&casino.protocol_version)
        .bind(casino.created_at)
        .bind(casino.created_at)
        .execute(self.pool())
        .await?;

        Ok(Casino {
            id,
            name: casino.name,
            url: casino.url,
            public_key: casino.public_key,
            status: casino.status,
            metadata: casino.metadata,
            protocol_version: casino.protocol_version,
            created_at: casino.created_at,
            updated_at: casino.created_at,
            last_seen_at: None,
        })
    }

    async fn find_casino(&self, id: &str) -> Result<Option<Casino>, DatabaseError> {
        self.fetch_casino("SELECT * FROM casinos WHERE id = ?", id)
            .await
    }

    async fn find_casino_by_public_key(
        &self,
        public_key: &str,
    ) -> Result<Option<Casino>, DatabaseError> {
        self.fetch_casino("SELECT * FROM casinos WHERE public_key = ?", public_key)
            .await
    }

    async fn update_casino(
        &self,
        id: &str,
        patch: &CasinoPatch,
        now: i64,
    ) -> Result<Option<Casino>, DatabaseError> {
        // socialLinks is replaced as a unit, so it is set before the merge
        // patch (which would otherwise merge it key by key).
        let (social_links, metadata) = match &patch.metadata {
            Some(meta) => {
                let mut rest = meta.clone();
                let links = rest
                    .social_links
                    .take()
                    .map(|links| serde_json::to_string(&links))
                    .transpose()?;
                (links, serde_json::to_string(&rest)?)
            }
            None => (None, "{}".to_string()),
        };

        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(UPDATE_CASINO_SQL)
            .bind(patch.name.as_deref())
            .bind(patch.url.as_deref())
            .bind(patch.status.map(CasinoStatus::as_str))
            .bind(social_links.as_deref())
            .bind(social_links.as_deref())
            .bind(&metadata)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, CasinoRow>("SELECT * FROM casinos WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Casino::try_from(row).map(Some)
    }

    async fn list_casinos(&self, filter: &CasinoFilter) -> Result<CasinoPage, DatabaseError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM casinos");
        push_filter(&mut count, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool()).await?;

        let mut page = QueryBuilder::<Sqlite>::new("SELECT * FROM casinos");
        push_filter(&mut page, filter);
        page.push(DISCOVERY_ORDER);
        page.push(" LIMIT ").push_bind(i64::from(filter.limit));
        page.push(" OFFSET ").push_bind(i64::from(filter.offset));

        let rows: Vec<CasinoRow> = page.build_query_as().fetch_all(self.pool()).await?;
        let casinos = rows
            .into_iter()
            .map(Casino::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CasinoPage {
            casinos,
            total: to_count(total),
        })
    }

    async fn count_casinos(&self, status: Option<CasinoStatus>) -> Result<u64, DatabaseError> {
        let (count,): (i64,) = if let Some(status) = status {
            sqlx::query_as("SELECT COUNT(*) FROM casinos WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(self.pool())
                .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM casinos")
                .fetch_one(self.pool())
                .await?
        };
        Ok(to_count(count))
    }

    async fn record_heartbeat(&self, heartbeat: NewHeartbeat) -> Result<Heartbeat, DatabaseError> {
        let id = uuid::Uuid::new_v4().to_string();
        let metrics = heartbeat
            .metrics
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool().begin().await?;

        let touched = sqlx::query(
            "UPDATE casinos SET status = ?, last_seen_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(heartbeat.status.as_str())
        .bind(heartbeat.observed_at)
        .bind(heartbeat.observed_at)
        .bind(&heartbeat.casino_id)
        .execute(&mut *tx)
        .await?;

        if touched.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Casino {}",
                heartbeat.casino_id
            )));
        }

        sqlx::query(
            "INSERT INTO heartbeats (id, casino_id, status, metrics, signature, observed_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&heartbeat.casino_id)
        .bind(heartbeat.status.as_str())
        .bind(metrics)
        .bind(&heartbeat.signature)
        .bind(heartbeat.observed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Heartbeat {
            id,
            casino_id: heartbeat.casino_id,
            status: heartbeat.status,
            metrics: heartbeat.metrics,
            signature: heartbeat.signature,
            observed_at: heartbeat.observed_at,
        })
    }

    async fn list_heartbeats(
        &self,
        casino_id: &str,
        limit: u32,
    ) -> Result<Vec<Heartbeat>, DatabaseError> {
        let rows = sqlx::query_as::<_, HeartbeatRow>(
            "SELECT * FROM heartbeats WHERE casino_id = ? ORDER BY observed_at DESC, rowid DESC LIMIT ?",
        )
        .bind(casino_id)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Heartbeat::try_from).collect()
    }

    async fn count_heartbeats_since(&self, since: i64) -> Result<u64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM heartbeats WHERE observed_at >= ?")
            .bind(since)
            .fetch_one(self.pool())
            .await?;
        Ok(to_count(count))
    }

    async fn mark_inactive(&self, cutoff: i64, now: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE casinos SET status = 'offline', updated_at = ? WHERE status != 'offline' AND COALESCE(last_seen_at, created_at) < ?",
        )
        .bind(now)
        .bind(cutoff)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }
}

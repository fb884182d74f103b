//! Row types for the registry tables.

use sqlx::FromRow;

use croupier_core::db::DatabaseError;

use crate::types::{Casino, CasinoStatus, Heartbeat};

#[derive(Debug, Clone, FromRow)]
pub struct CasinoRow {
    pub id: String,
    pub name: String,
    pub url: String,
    pub public_key: String,
    pub status: String,
    pub metadata: String,
    pub protocol_version: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_seen_at: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct HeartbeatRow {
    pub id: String,
    pub casino_id: String,
    pub status: String,
    pub metrics: Option<String>,
    pub signature: String,
    pub observed_at: i64,
}

fn parse_status(raw: &str) -> Result<CasinoStatus, DatabaseError> {
    raw.parse()
        .map_err(|e: crate::types::UnknownVariant| DatabaseError::Serialization(e.to_string()))
}

impl TryFrom<CasinoRow> for Casino {
    type Error = DatabaseError;

    fn try_from(row: CasinoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse_status(&row.status)?,
            metadata: serde_json::from_str(&row.metadata)?,
            id: row.id,
            name: row.name,
            url: row.url,
            public_key: row.public_key,
            protocol_version: row.protocol_version,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_seen_at: row.last_seen_at,
        })
    }
}

impl TryFrom<HeartbeatRow> for Heartbeat {
    type Error = DatabaseError;

    fn try_from(row: HeartbeatRow) -> Result<Self, Self::Error> {
        let metrics = row
            .metrics
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(Self {
            status: parse_status(&row.status)?,
            metrics,
            id: row.id,
            casino_id: row.casino_id,
            signature: row.signature,
            observed_at: row.observed_at,
        })
    }
}

//! Heartbeat: a registered casino proves liveness and reports its status.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use croupier_core::db::unix_timestamp;
use croupier_crypto::verify;

use super::{ProtocolError, SignedRequest};
use crate::storage::{NewHeartbeat, SharedStore};
use crate::types::{CasinoStatus, HeartbeatMetrics};
use crate::validation::validate_heartbeat;

/// Body of `POST /api/v1/casinos/{id}/heartbeat`.
///
/// Carries no key of its own; it is verified against the key on file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub status: CasinoStatus,
    /// Client clock, informational only.
    pub timestamp: i64,
    #[serde(default)]
    pub metrics: Option<HeartbeatMetrics>,
    #[serde(default)]
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatAck {
    pub acknowledged: bool,
    pub server_time: i64,
    /// Advisory; the sweeper timeout is what actually matters.
    pub next_heartbeat_in_secs: u64,
}

pub struct HeartbeatProtocol {
    store: SharedStore,
    next_heartbeat_in_secs: u64,
}

impl HeartbeatProtocol {
    pub fn new(store: SharedStore, next_heartbeat_in_secs: u64) -> Self {
        Self {
            store,
            next_heartbeat_in_secs,
        }
    }

    /// Accept a heartbeat for `casino_id`.
    ///
    /// An unknown id is reported as not found without any signature work.
    /// Any of the four statuses may be self-reported.
    #[instrument(skip(self, request), fields(op = "heartbeat"))]
    pub async fn heartbeat(
        &self,
        casino_id: &str,
        request: SignedRequest<HeartbeatRequest>,
    ) -> Result<HeartbeatAck, ProtocolError> {
        validate_heartbeat(&request.payload)?;

        let casino = self
            .store
            .find_casino(casino_id)
            .await?
            .ok_or_else(|| ProtocolError::NotFound(casino_id.to_string()))?;

        if !verify(
            &request.message(),
            &request.payload.signature,
            &casino.public_key,
        ) {
            warn!(casino_id, "Heartbeat signature rejected");
            return Err(ProtocolError::InvalidSignature);
        }

        let now = unix_timestamp();
        let payload = request.payload;
        let status = payload.status;
        self.store
            .record_heartbeat(NewHeartbeat {
                casino_id: casino.id.clone(),
                status,
                metrics: payload.metrics,
                signature: payload.signature,
                observed_at: now,
            })
            .await?;

        debug!(casino_id, %status, "Heartbeat accepted");
        Ok(HeartbeatAck {
            acknowledged: true,
            server_time: now,
            next_heartbeat_in_secs: self.next_heartbeat_in_secs,
        })
    }
}

//! Update: a registered casino edits its published record.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use croupier_core::db::unix_timestamp;
use croupier_crypto::verify;

use super::{ProtocolError, SignedRequest};
use crate::storage::{CasinoPatch, SharedStore};
use crate::types::{Casino, CasinoStatus, MetadataPatch};
use crate::validation::validate_update;

/// Body of `PATCH /api/v1/casinos/{id}`. Absent fields keep their value.
///
/// Has no `publicKey` field; the key is fixed at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<CasinoStatus>,
    #[serde(default)]
    pub metadata: Option<MetadataPatch>,
    #[serde(default)]
    pub signature: String,
}

impl UpdateRequest {
    /// The store-level patch: only fields present in the body, name trimmed.
    pub fn to_patch(&self) -> CasinoPatch {
        CasinoPatch {
            name: self.name.as_deref().map(|name| name.trim().to_string()),
            url: self.url.clone(),
            status: self.status,
            metadata: self.metadata.clone(),
        }
    }
}

pub struct UpdateProtocol {
    store: SharedStore,
}

impl UpdateProtocol {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request), fields(op = "update"))]
    pub async fn update(
        &self,
        casino_id: &str,
        request: SignedRequest<UpdateRequest>,
    ) -> Result<Casino, ProtocolError> {
        validate_update(&request.payload)?;

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
            warn!(casino_id, "Update signature rejected");
            return Err(ProtocolError::InvalidSignature);
        }

        let updated = self
            .store
            .update_casino(&casino.id, &request.payload.to_patch(), unix_timestamp())
            .await?
            .ok_or_else(|| ProtocolError::NotFound(casino_id.to_string()))?;

        info!(casino_id, "Casino updated");
        Ok(updated)
    }
}

//! Registration: a new casino claims a public key as its identity.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use croupier_core::db::{DatabaseError, unix_timestamp};
use croupier_crypto::{is_valid_public_key, verify};

use super::{ProtocolError, SignedRequest};
use crate::storage::{NewCasino, SharedStore};
use crate::types::{Casino, CasinoStatus, MetadataPatch, PROTOCOL_VERSION};
use crate::validation::validate_registration;

/// Body of `POST /api/v1/casinos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub url: String,
    pub public_key: String,
    #[serde(default)]
    pub metadata: MetadataPatch,
    #[serde(default)]
    pub signature: String,
}

pub struct RegistrationProtocol {
    store: SharedStore,
}

impl RegistrationProtocol {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Admit a new casino.
    ///
    /// The signature is checked against the claimed key before storage is
    /// touched. The store's unique index on `public_key` settles concurrent
    /// registrations of the same key.
    #[instrument(skip(self, request), fields(op = "register"))]
    pub async fn register(
        &self,
        request: SignedRequest<RegisterRequest>,
    ) -> Result<Casino, ProtocolError> {
        validate_registration(&request.payload)?;

        let payload = &request.payload;
        if !is_valid_public_key(&payload.public_key) {
            return Err(ProtocolError::InvalidPublicKey);
        }
        if !verify(&request.message(), &payload.signature, &payload.public_key) {
            warn!(public_key = %payload.public_key, "Registration signature rejected");
            return Err(ProtocolError::InvalidSignature);
        }

        if self
            .store
            .find_casino_by_public_key(&payload.public_key)
            .await?
            .is_some()
        {
            return Err(ProtocolError::AlreadyExists);
        }

        let payload = request.payload;
        let new = NewCasino {
            name: payload.name.trim().to_string(),
            url: payload.url,
            public_key: payload.public_key,
            status: CasinoStatus::Online,
            metadata: payload.metadata.into_metadata(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            created_at: unix_timestamp(),
        };

        let casino = self.store.create_casino(new).await.map_err(|e| match e {
            DatabaseError::AlreadyExists(_) => ProtocolError::AlreadyExists,
            other => ProtocolError::Storage(other),
        })?;

        info!(casino_id = %casino.id, name = %casino.name, "Casino registered");
        Ok(casino)
    }
}

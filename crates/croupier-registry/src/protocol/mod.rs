//! Signed-write protocols: registration, heartbeat and update.
//!
//! Every write arrives as a JSON body carrying a detached `signature`. The
//! body is kept verbatim next to its typed form so the signature is checked
//! against exactly what the client sent, not a re-serialization of it.

pub mod heartbeat;
pub mod registration;
pub mod update;

#[cfg(test)]
pub(crate) mod test_support;

use serde::de::DeserializeOwned;
use serde_json::Value;

use croupier_core::db::DatabaseError;
use croupier_crypto::canonicalize;

use crate::validation::FieldError;

pub use heartbeat::{HeartbeatAck, HeartbeatProtocol, HeartbeatRequest};
pub use registration::{RegisterRequest, RegistrationProtocol};
pub use update::{UpdateProtocol, UpdateRequest};

/// Named outcomes of the protocols and queries.
///
/// Everything except `Storage` is an expected rejection with a stable wire
/// code; `Storage` is an infrastructure fault.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("A casino is already registered with this public key")]
    AlreadyExists,

    #[error("Casino not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {} field(s) rejected", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<Vec<FieldError>> for ProtocolError {
    fn from(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

/// A typed write request together with the exact JSON it was parsed from.
#[derive(Debug, Clone)]
pub struct SignedRequest<T> {
    pub payload: T,
    raw: Value,
}

impl<T: DeserializeOwned> SignedRequest<T> {
    /// Parse `raw` into `T`, keeping `raw` for canonicalization.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let payload = T::deserialize(&raw)?;
        Ok(Self { payload, raw })
    }
}

impl<T> SignedRequest<T> {
    /// The canonical byte message the signature must cover.
    pub fn message(&self) -> Vec<u8> {
        canonicalize(&self.raw, &[])
    }

    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

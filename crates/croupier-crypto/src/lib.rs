//! `Croupier` Signature Codec
//!
//! Every write to the registry is authorized by a detached signature over a
//! canonical form of the request body.
//!
//! ## Primitives
//!
//! - **Canonicalization**: JSON with object keys sorted at every nesting
//!   level and the `signature` field removed, serialized without whitespace
//! - **Keys**: Ed25519 public keys, base-58 encoded (32 raw bytes)
//! - **Signatures**: detached Ed25519 signatures, base-58 encoded (64 raw bytes)

pub mod canonical;
pub mod error;
pub mod keypair;
pub mod signature;

pub use canonical::{SIGNATURE_FIELD, canonicalize, canonicalize_serializable};
pub use error::CryptoError;
pub use keypair::CasinoKeyPair;
pub use signature::{is_valid_public_key, verify, verify_payload};

//! Ed25519 signature verification over base-58 encoded keys and signatures.
//!
//! Every failure (bad encoding, wrong length, weak key, wrong signer,
//! tampered message) collapses into `false`. Callers report one uniform
//! "invalid signature" outcome and never learn which check failed.

use ed25519_dalek::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH, Signature, VerifyingKey};
use serde_json::Value;

use crate::canonical::canonicalize;

/// Decode a base-58 string into exactly `N` bytes.
fn decode_fixed<const N: usize>(encoded: &str) -> Option<[u8; N]> {
    let bytes = bs58::decode(encoded.trim()).into_vec().ok()?;
    bytes.try_into().ok()
}

fn decode_verifying_key(public_key: &str) -> Option<VerifyingKey> {
    let bytes = decode_fixed::<PUBLIC_KEY_LENGTH>(public_key)?;
    let key = VerifyingKey::from_bytes(&bytes).ok()?;
    // Small-order points verify forged signatures; they are never identities.
    (!key.is_weak()).then_some(key)
}

/// Check that `public_key` is a base-58 encoded, well-formed Ed25519 point.
///
/// This does not consult any registry; an unregistered key is still valid.
pub fn is_valid_public_key(public_key: &str) -> bool {
    decode_verifying_key(public_key).is_some()
}

/// Verify a base-58 detached signature over `message` against `public_key`.
pub fn verify(message: &[u8], signature: &str, public_key: &str) -> bool {
    let Some(key) = decode_verifying_key(public_key) else {
        return false;
    };
    let Some(sig_bytes) = decode_fixed::<SIGNATURE_LENGTH>(signature) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);
    key.verify_strict(message, &signature).is_ok()
}

/// Canonicalize a JSON payload and verify the signature over it.
pub fn verify_payload(payload: &Value, signature: &str, public_key: &str) -> bool {
    verify(&canonicalize(payload, &[]), signature, public_key)
}

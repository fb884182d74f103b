//! Casino signing key management.
//!
//! Each casino holds a long-lived Ed25519 keypair. The public half is its
//! registry identity; the secret half signs every write it submits.

use std::path::Path;

use ed25519_dalek::{SECRET_KEY_LENGTH, Signer, SigningKey};
use rand::rngs::OsRng;
use serde_json::Value;
use zeroize::Zeroize;

use crate::canonical::{SIGNATURE_FIELD, canonicalize};
use crate::error::CryptoError;

/// An Ed25519 signing keypair for a casino.
pub struct CasinoKeyPair {
    signing: SigningKey,
}

impl std::fmt::Debug for CasinoKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CasinoKeyPair")
            .field("public", &self.public_key_base58())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl CasinoKeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Reconstruct from raw 32-byte secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: SECRET_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; SECRET_KEY_LENGTH];
        arr.copy_from_slice(bytes);
        let signing = SigningKey::from_bytes(&arr);
        arr.zeroize();
        Ok(Self { signing })
    }

    /// Reconstruct from a base-58 encoded secret key.
    pub fn from_secret_base58(encoded: &str) -> Result<Self, CryptoError> {
        let mut bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let result = Self::from_secret_bytes(&bytes);
        bytes.zeroize();
        result
    }

    /// The public key as the base-58 string casinos register with.
    pub fn public_key_base58(&self) -> String {
        bs58::encode(self.signing.verifying_key().as_bytes()).into_string()
    }

    /// Sign raw message bytes, returning a base-58 detached signature.
    pub fn sign(&self, message: &[u8]) -> String {
        bs58::encode(self.signing.sign(message).to_bytes()).into_string()
    }

    /// Sign the canonical form of a JSON payload.
    pub fn sign_payload(&self, payload: &Value) -> String {
        self.sign(&canonicalize(payload, &[]))
    }

    /// Sign a request body and return it with its `signature` field set.
    ///
    /// Any existing `signature` is replaced. Fails if the payload is not a
    /// JSON object.
    pub fn sign_request(&self, mut payload: Value) -> Result<Value, CryptoError> {
        let signature = self.sign_payload(&payload);
        let Value::Object(map) = &mut payload else {
            return Err(CryptoError::SerializationError(
                "signed requests must be JSON objects".to_string(),
            ));
        };
        map.insert(SIGNATURE_FIELD.to_string(), Value::String(signature));
        Ok(payload)
    }

    /// Save the secret key to a file with restrictive permissions.
    pub fn save_to_file(&self, path: &Path) -> Result<(), CryptoError> {
        let dir = path.parent().ok_or_else(|| {
            CryptoError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no parent directory",
            ))
        })?;
        std::fs::create_dir_all(dir)?;

        let mut bytes = self.signing.to_bytes();
        std::fs::write(path, bytes)?;
        bytes.zeroize();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Load a keypair from a file containing the 32-byte secret key.
    ///
    /// On Unix, refuses files readable by anyone but the owner.
    pub fn load_from_file(path: &Path) -> Result<Self, CryptoError> {
        use std::io::Read;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)?;
            let mode = metadata.permissions().mode() & 0o777;
            if mode != 0o600 {
                return Err(CryptoError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("Signing key file has insecure permissions: {mode:o} (expected 600)"),
                )));
            }
        }

        let mut file = std::fs::File::open(path)?;
        let mut buf = [0u8; SECRET_KEY_LENGTH];
        file.read_exact(&mut buf)?;
        let result = Self::from_secret_bytes(&buf);
        buf.zeroize();
        result
    }
}

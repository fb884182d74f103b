//! Crypto error types.

/// Errors from key handling and payload signing.
///
/// Verification never returns these: it reports a plain `bool`.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid base-58 encoding: {0}")]
    Encoding(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

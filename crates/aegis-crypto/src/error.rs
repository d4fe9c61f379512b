//! Crypto error type and its mapping into [`AppError`].

use aegis_core::AppError;
use thiserror::Error;

/// Errors produced by the key primitives and envelope codec.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The operating system entropy source failed.
    #[error("entropy source failure: {0}")]
    Entropy(String),

    /// A key had the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// A nonce had the wrong length.
    #[error("invalid nonce length: expected {expected} bytes, got {actual}")]
    InvalidNonceLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Malformed input such as bad hex or an empty salt.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Encryption itself failed.
    #[error("encryption failed")]
    Encryption,

    /// Authenticated decryption failed: wrong key, wrong password or tampered data.
    #[error("authentication failed")]
    Authentication,
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Authentication => AppError::authentication("Invalid password"),
            CryptoError::InvalidKeyLength { .. }
            | CryptoError::InvalidNonceLength { .. }
            | CryptoError::InvalidInput(_) => AppError::validation(err.to_string()),
            CryptoError::Entropy(_) | CryptoError::Encryption => {
                AppError::internal(err.to_string())
            }
        }
    }
}

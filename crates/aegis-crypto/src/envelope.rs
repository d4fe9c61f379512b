//! Password envelope codec: wraps a FileKey under a password-derived KEK.
//!
//! ```text
//! salt  = random(16)
//! iv    = random(12)
//! kek   = PBKDF2-HMAC-SHA256(password, salt, iterations, 32)
//! ct    = AES-256-GCM(kek, iv, file_key)      // 32 + 16 bytes
//! ```
//!
//! A wrong password and a tampered triple both surface as
//! [`CryptoError::Authentication`].

use aegis_core::config::CryptoConfig;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::aead::{decrypt_authenticated, encrypt_authenticated};
use crate::error::CryptoError;
use crate::kdf::derive_key;
use crate::keys::FileKey;
use crate::random::generate_random_key;
use crate::{DEFAULT_PBKDF2_ITERATIONS, KEY_SIZE, NONCE_SIZE, SALT_SIZE};

/// A FileKey protected under one password. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    #[serde(with = "hex::serde")]
    pub salt: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub iv: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
}

/// Wraps and unwraps FileKeys with a fixed PBKDF2 work factor.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeCodec {
    iterations: u32,
    salt_length: usize,
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new(DEFAULT_PBKDF2_ITERATIONS)
    }
}

impl EnvelopeCodec {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            salt_length: SALT_SIZE,
        }
    }

    /// Build a codec from validated configuration.
    pub fn from_config(config: &CryptoConfig) -> Self {
        Self {
            iterations: config.pbkdf2_iterations,
            salt_length: config.salt_length,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Wrap `file_key` under `password` with a fresh salt and IV.
    pub fn wrap_key(&self, file_key: &FileKey, password: &str) -> Result<WrappedKey, CryptoError> {
        let salt = generate_random_key(self.salt_length)?;
        let iv = generate_random_key(NONCE_SIZE)?;
        let kek = derive_key(password.as_bytes(), &salt, self.iterations, KEY_SIZE)?;
        let ciphertext = encrypt_authenticated(&kek, &iv, file_key.as_bytes())?;
        Ok(WrappedKey {
            salt,
            iv,
            ciphertext,
        })
    }

    /// Recover the FileKey from `wrapped` using `password`.
    pub fn unwrap_key(&self, wrapped: &WrappedKey, password: &str) -> Result<FileKey, CryptoError> {
        if wrapped.iv.len() != NONCE_SIZE {
            return Err(CryptoError::Authentication);
        }
        let kek = derive_key(password.as_bytes(), &wrapped.salt, self.iterations, KEY_SIZE)
            .map_err(|_| CryptoError::Authentication)?;
        let mut plaintext = decrypt_authenticated(&kek, &wrapped.iv, &wrapped.ciphertext)?;

        let key = FileKey::from_slice(&plaintext).map_err(|_| CryptoError::Authentication);
        plaintext.zeroize();
        key
    }
}

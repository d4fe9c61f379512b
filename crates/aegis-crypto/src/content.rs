//! Bulk content sealing with a FileKey.
//!
//! The server never calls these on file bodies; they exist for the client
//! side that receives a FileKey from an unwrap and must decrypt the
//! opaque ciphertext it downloads.

use serde::{Deserialize, Serialize};

use crate::NONCE_SIZE;
use crate::aead::{decrypt_authenticated, encrypt_authenticated};
use crate::error::CryptoError;
use crate::keys::FileKey;
use crate::random::random_array;

/// Ciphertext of one file body plus the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedContent {
    #[serde(with = "hex::serde")]
    pub nonce: [u8; NONCE_SIZE],
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn seal_content(key: &FileKey, plaintext: &[u8]) -> Result<SealedContent, CryptoError> {
    let nonce = random_array::<NONCE_SIZE>()?;
    let ciphertext = encrypt_authenticated(key.as_bytes(), &nonce, plaintext)?;
    Ok(SealedContent { nonce, ciphertext })
}

/// Decrypt content sealed by [`seal_content`].
pub fn open_content(key: &FileKey, sealed: &SealedContent) -> Result<Vec<u8>, CryptoError> {
    decrypt_authenticated(key.as_bytes(), &sealed.nonce, &sealed.ciphertext)
}

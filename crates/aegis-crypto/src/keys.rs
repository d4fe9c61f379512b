//! The per-file symmetric key.

use zeroize::{Zeroize, Zeroizing};

use crate::KEY_SIZE;
use crate::error::CryptoError;
use crate::random::random_array;

/// A per-file 256-bit encryption key. Zeroized on drop.
#[derive(Clone)]
pub struct FileKey {
    bytes: [u8; KEY_SIZE],
}

impl FileKey {
    /// Generate a fresh random key from the OS CSPRNG.
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self::from_bytes(random_array::<KEY_SIZE>()?))
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice that must be exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_SIZE] =
            slice
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: slice.len(),
                })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Parse a key from 64 hex characters.
    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        let decoded = Zeroizing::new(
            hex::decode(encoded.trim())
                .map_err(|e| CryptoError::InvalidInput(format!("file key is not hex: {e}")))?,
        );
        Self::from_slice(&decoded)
    }

    /// Hex encoding for handing the key back to a client.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for FileKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

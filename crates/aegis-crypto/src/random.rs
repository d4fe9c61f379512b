//! Cryptographically secure random bytes from the OS entropy source.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::TOKEN_BYTES;
use crate::error::CryptoError;

/// Fill a fresh buffer of `length` bytes from the OS CSPRNG.
///
/// Used for FileKeys, salts, IVs and tokens. An entropy failure is fatal
/// for the calling operation and is never retried here.
pub fn generate_random_key(length: usize) -> Result<Vec<u8>, CryptoError> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Entropy(e.to_string()))?;
    Ok(bytes)
}

/// Fill a fixed-size array from the OS CSPRNG.
pub(crate) fn random_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Entropy(e.to_string()))?;
    Ok(bytes)
}

/// Generate a share token: 32 random bytes, lowercase hex (64 characters).
pub fn generate_token() -> Result<String, CryptoError> {
    let bytes = random_array::<TOKEN_BYTES>()?;
    Ok(hex::encode(bytes))
}

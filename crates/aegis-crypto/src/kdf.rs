//! Password-based key derivation (PBKDF2-HMAC-SHA256).

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Derive `output_length` bytes from `password` and `salt`.
///
/// Deterministic: the same inputs always produce the same key. The result
/// is zeroized when dropped.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_length: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if salt.is_empty() {
        return Err(CryptoError::InvalidInput("salt must not be empty".into()));
    }
    if iterations == 0 {
        return Err(CryptoError::InvalidInput(
            "iteration count must be positive".into(),
        ));
    }
    if output_length == 0 {
        return Err(CryptoError::InvalidInput(
            "output length must be positive".into(),
        ));
    }

    let mut key = Zeroizing::new(vec![0u8; output_length]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    Ok(key)
}

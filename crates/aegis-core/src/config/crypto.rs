//! Key derivation and cipher parameters.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Lowest PBKDF2 iteration count accepted from configuration.
pub const MIN_PBKDF2_ITERATIONS: u32 = 10_000;

/// Parameters for password-based key wrapping.
///
/// The cipher is AES-256-GCM, so the key and IV lengths are fixed; they are
/// still configurable so that a misconfigured deployment fails at startup
/// rather than on the first share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// PBKDF2-HMAC-SHA256 iteration count.
    #[serde(default = "default_iterations")]
    pub pbkdf2_iterations: u32,
    /// Derived key length in bytes.
    #[serde(default = "default_key_length")]
    pub key_length: usize,
    /// Salt length in bytes.
    #[serde(default = "default_salt_length")]
    pub salt_length: usize,
    /// AES-GCM IV length in bytes.
    #[serde(default = "default_iv_length")]
    pub iv_length: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_iterations(),
            key_length: default_key_length(),
            salt_length: default_salt_length(),
            iv_length: default_iv_length(),
        }
    }
}

impl CryptoConfig {
    /// Reject parameters that would weaken or break the key wrap.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.pbkdf2_iterations < MIN_PBKDF2_ITERATIONS {
            return Err(AppError::configuration(format!(
                "PBKDF2 iterations too low: {} (minimum {MIN_PBKDF2_ITERATIONS})",
                self.pbkdf2_iterations
            )));
        }
        if self.key_length != 32 {
            return Err(AppError::configuration(format!(
                "key length must be 32 bytes for AES-256-GCM, got {}",
                self.key_length
            )));
        }
        if !(8..=16).contains(&self.salt_length) {
            return Err(AppError::configuration(format!(
                "salt length must be between 8 and 16 bytes, got {}",
                self.salt_length
            )));
        }
        if self.iv_length != 12 {
            return Err(AppError::configuration(format!(
                "IV length must be 12 bytes for AES-GCM, got {}",
                self.iv_length
            )));
        }
        Ok(())
    }
}

fn default_iterations() -> u32 {
    100_000
}

fn default_key_length() -> usize {
    32
}

fn default_salt_length() -> usize {
    16
}

fn default_iv_length() -> usize {
    12
}

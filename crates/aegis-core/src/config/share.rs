//! Share link settings and the share password policy.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Share password policy and token settings.
///
/// Share passwords are the only gate in front of a shared file, so the
/// defaults are stricter than account passwords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Minimum share password length.
    #[serde(default = "default_min_length")]
    pub password_min_length: usize,
    /// Characters that satisfy the special-character requirement.
    #[serde(default = "default_special_characters")]
    pub special_characters: String,
    /// Minimum zxcvbn score (0-4). `0` disables the entropy check.
    #[serde(default)]
    pub min_strength_score: u8,
    /// How many fresh tokens to try when the store reports a collision.
    #[serde(default = "default_max_token_attempts")]
    pub max_token_attempts: u32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            password_min_length: default_min_length(),
            special_characters: default_special_characters(),
            min_strength_score: 0,
            max_token_attempts: default_max_token_attempts(),
        }
    }
}

impl ShareConfig {
    /// Validate policy values.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.password_min_length < 12 {
            return Err(AppError::configuration(format!(
                "share.password_min_length must be at least 12, got {}",
                self.password_min_length
            )));
        }
        if self.special_characters.is_empty() {
            return Err(AppError::configuration(
                "share.special_characters must not be empty",
            ));
        }
        if self.min_strength_score > 4 {
            return Err(AppError::configuration(format!(
                "share.min_strength_score must be 0-4, got {}",
                self.min_strength_score
            )));
        }
        if self.max_token_attempts == 0 {
            return Err(AppError::configuration(
                "share.max_token_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_min_length() -> usize {
    12
}

fn default_special_characters() -> String {
    "!@#$%^&*()_+-=[]{}|;:,.<>?".to_string()
}

fn default_max_token_attempts() -> u32 {
    3
}

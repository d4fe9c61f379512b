//! Share password policy.

use aegis_core::config::ShareConfig;
use aegis_core::error::AppError;

/// Validates share passwords.
///
/// A share password is the only thing between a link holder and the file,
/// so every character class is mandatory and the minimum length is higher
/// than for login passwords.
#[derive(Debug, Clone)]
pub struct SharePasswordPolicy {
    min_length: usize,
    special_characters: String,
    min_strength_score: u8,
}

impl SharePasswordPolicy {
    /// Creates a policy from share configuration.
    pub fn new(config: &ShareConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            special_characters: config.special_characters.clone(),
            min_strength_score: config.min_strength_score,
        }
    }

    /// Validates a password, reporting the first violation found.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }

        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(AppError::validation(
                "Password must contain at least one uppercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(AppError::validation(
                "Password must contain at least one lowercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "Password must contain at least one digit",
            ));
        }

        if !password
            .chars()
            .any(|c| self.special_characters.contains(c))
        {
            return Err(AppError::validation(format!(
                "Password must contain at least one special character ({})",
                self.special_characters
            )));
        }

        if self.min_strength_score > 0 {
            let estimate = zxcvbn::zxcvbn(password, &[]);
            if (estimate.score() as u8) < self.min_strength_score {
                return Err(AppError::validation(
                    "Password is too weak. Please use a stronger password with more entropy.",
                ));
            }
        }

        Ok(())
    }
}

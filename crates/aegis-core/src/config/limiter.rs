//! Failed-password attempt limiter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Attempt limiter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Backend: `"memory"` (single process) or `"cache"` (shared cache provider).
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Failed attempts within the window that trigger a lockout.
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,
    /// Window in seconds over which failures are counted.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
    /// Lockout duration in seconds.
    #[serde(default = "default_lockout")]
    pub lockout_seconds: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            max_failed_attempts: default_max_failed_attempts(),
            window_seconds: default_window(),
            lockout_seconds: default_lockout(),
        }
    }
}

impl LimiterConfig {
    /// Failure counting window.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    /// Lockout duration.
    pub fn lockout(&self) -> Duration {
        Duration::from_secs(self.lockout_seconds)
    }

    /// Validate limiter values.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_failed_attempts == 0 {
            return Err(AppError::configuration(
                "limiter.max_failed_attempts must be at least 1",
            ));
        }
        if self.window_seconds == 0 || self.lockout_seconds == 0 {
            return Err(AppError::configuration(
                "limiter.window_seconds and limiter.lockout_seconds must be positive",
            ));
        }
        match self.backend.as_str() {
            "memory" | "cache" => Ok(()),
            other => Err(AppError::configuration(format!(
                "Unknown limiter backend: '{other}'. Supported: memory, cache"
            ))),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_window() -> u64 {
    900
}

fn default_lockout() -> u64 {
    300
}

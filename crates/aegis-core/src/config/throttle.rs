//! Per-client request throttle for public share endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Requests one client may make against one share token per window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window")]
    pub window_seconds: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window(),
        }
    }
}

impl ThrottleConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_requests == 0 || self.window_seconds == 0 {
            return Err(AppError::configuration(
                "throttle.max_requests and throttle.window_seconds must be positive",
            ));
        }
        Ok(())
    }
}

fn default_max_requests() -> u32 {
    10
}

fn default_window() -> u64 {
    60
}

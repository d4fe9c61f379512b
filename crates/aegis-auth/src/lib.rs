//! # aegis-auth
//!
//! Gatekeeping around share links:
//!
//! - `password`: the share password policy (stricter than account passwords)
//! - `ownership`: file ownership checks before a share is created or changed
//! - `limiter`: per-token failed-password counting and temporary lockout
//! - `throttle`: per-client request limits on share access

pub mod limiter;
pub mod ownership;
pub mod password;
pub mod throttle;

pub use limiter::{
    AttemptLimiter, AttemptPermit, AttemptState, CacheAttemptLimiter, MemoryAttemptLimiter,
};
pub use ownership::{CatalogOwnershipChecker, OwnershipChecker};
pub use password::SharePasswordPolicy;
pub use throttle::RequestThrottle;

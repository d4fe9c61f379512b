//! Share access audit entities.

pub mod model;

pub use model::{AccessAttempt, AccessStats, NewAccessLog, ShareAccessLog};

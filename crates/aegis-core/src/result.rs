//! Convenience result type alias for Aegis.

use crate::error::AppError;

/// A specialized `Result` type for Aegis operations.
pub type AppResult<T> = Result<T, AppError>;

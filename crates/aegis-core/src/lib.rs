//! # aegis-core
//!
//! Core crate for Aegis. Contains the cache trait, configuration schemas,
//! typed identifiers, and the unified error system shared by every other
//! crate in the workspace.
//!
//! This crate has **no** internal dependencies on other Aegis crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;

//! Shared domain types.

pub mod id;

pub use id::{FileId, ShareId, UserId};

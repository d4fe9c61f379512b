//! # aegis-entity
//!
//! Domain entities for Aegis: share records and their derived views, the
//! file catalog descriptor, and share access-log entries.

pub mod access;
pub mod file;
pub mod share;

//! Core traits shared across Aegis crates.

pub mod cache;

pub use cache::CacheProvider;

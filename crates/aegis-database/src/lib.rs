//! # aegis-database
//!
//! PostgreSQL connection management, migrations, and the store interfaces
//! the share services depend on. Each store has a PostgreSQL repository
//! and an in-process implementation for tests and single-node tooling.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{AccessLogStore, FileCatalog, ShareStore};

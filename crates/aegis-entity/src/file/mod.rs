//! File catalog entities.

pub mod model;

pub use model::FileDescriptor;

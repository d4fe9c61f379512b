//! PostgreSQL store implementations.

pub mod access_log;
pub mod file;
pub mod share;

pub use access_log::AccessLogRepository;
pub use file::FileRepository;
pub use share::ShareRepository;

//! Share links: issue, validate, access, and manage.

pub mod access;
pub mod keys;
pub mod link;
pub mod service;

pub use access::{AccessGrant, AccessService};
pub use keys::{FileKeySource, ProvidedFileKey};
pub use link::LinkService;
pub use service::{CreateShareRequest, ShareService, UpdateShareRequest};

//! # aegis-service
//!
//! Business logic for share links. Each service orchestrates the stores,
//! the envelope codec, and the auth collaborators to implement one group of
//! use cases:
//!
//! - [`LinkService`]: token issuance, link formatting, and URL parsing
//! - [`AccessService`]: recipient-side validation, password-gated unwrap,
//!   quota consumption, and the access audit trail
//! - [`ShareService`]: owner-side creation, update, revocation, and listing
//!
//! Services follow constructor injection. All dependencies are provided
//! at construction time via `Arc` references.

pub mod context;
pub mod share;

pub use context::RequestContext;
pub use share::{
    AccessGrant, AccessService, CreateShareRequest, FileKeySource, LinkService, ProvidedFileKey,
    ShareService, UpdateShareRequest,
};

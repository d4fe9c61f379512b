//! Share domain entities.

pub mod filter;
pub mod link;
pub mod metadata;
pub mod model;
pub mod patch;

pub use filter::ShareFilter;
pub use link::ShareLink;
pub use metadata::{PublicShareMetadata, ShareExpiryInfo};
pub use model::{NewShare, ShareRecord, ShareStatus, UNLIMITED_DOWNLOADS};
pub use patch::SharePatch;

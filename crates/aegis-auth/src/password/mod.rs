//! Share password policy enforcement.

pub mod policy;

pub use policy::SharePasswordPolicy;

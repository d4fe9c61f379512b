//! # aegis-crypto
//!
//! Key primitives and the password envelope codec.
//!
//! ```text
//! FileKey (256-bit, random per file)
//!   ├── Share wrap: AES-256-GCM(key = PBKDF2-SHA256(password, salt), nonce = iv)
//!   └── Content seal: AES-256-GCM(key = FileKey, nonce = random 96-bit)
//! ```
//!
//! Every function here is stateless. Nothing in this crate touches storage.

pub mod aead;
pub mod content;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod random;

pub use aead::{decrypt_authenticated, encrypt_authenticated};
pub use content::{SealedContent, open_content, seal_content};
pub use envelope::{EnvelopeCodec, WrappedKey};
pub use error::CryptoError;
pub use kdf::derive_key;
pub use keys::FileKey;
pub use random::{generate_random_key, generate_token};

/// Size of a FileKey and of a derived KEK in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Size of the PBKDF2 salt stored with each wrapped key.
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM nonce (96-bit).
pub const NONCE_SIZE: usize = 12;

/// Size of an AES-GCM authentication tag.
pub const TAG_SIZE: usize = 16;

/// Random bytes behind a share token (hex-encoded to 64 characters).
pub const TOKEN_BYTES: usize = 32;

/// Default PBKDF2-HMAC-SHA256 iteration count.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

//! Share link token generation, formatting, and parsing.

use aegis_core::error::AppError;
use aegis_crypto::generate_token;
use aegis_entity::share::{ShareLink, ShareRecord};

/// Path segment between the base URL and the token.
pub const SHARE_PATH: &str = "/v1/share/";

/// Length of a hex-encoded share token.
pub const TOKEN_LENGTH: usize = 64;

/// Whether `token` has the exact shape of an issued token: 64 lowercase
/// hex characters.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Generates share tokens and converts between tokens and public links.
#[derive(Debug, Clone)]
pub struct LinkService {
    base_url: String,
}

impl LinkService {
    /// Creates a link service for `base_url`. A trailing `/` is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A fresh 256-bit token from the OS CSPRNG, hex-encoded.
    pub fn generate_secure_token(&self) -> Result<String, AppError> {
        Ok(generate_token()?)
    }

    /// `{base_url}/v1/share/{token}`.
    pub fn share_url(&self, token: &str) -> String {
        format!("{}{SHARE_PATH}{token}", self.base_url)
    }

    /// The public link for `record`.
    pub fn generate_share_link(&self, record: &ShareRecord) -> Result<ShareLink, AppError> {
        if record.token.is_empty() {
            return Err(AppError::validation("Share has no token"));
        }
        if !is_well_formed_token(&record.token) {
            return Err(AppError::validation("Share token is malformed"));
        }
        Ok(ShareLink {
            share_id: record.id,
            url: self.share_url(&record.token),
            token: record.token.clone(),
            expires_at: record.expires_at,
            max_downloads: record.max_downloads,
        })
    }

    /// Extract the token from a full share URL.
    ///
    /// The URL must start with this service's base URL followed by the
    /// share path, and must carry a non-empty token segment.
    pub fn validate_share_url(&self, url: &str) -> Result<String, AppError> {
        let url = url.trim();
        let prefix = format!("{}{SHARE_PATH}", self.base_url);
        let rest = url
            .strip_prefix(&prefix)
            .ok_or_else(|| AppError::validation("Invalid share URL format"))?;

        let token = rest
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        if token.is_empty() {
            return Err(AppError::validation("Share token missing from URL"));
        }
        if token.contains('/') {
            return Err(AppError::validation("Invalid share URL format"));
        }
        Ok(token.to_string())
    }

    /// Accept either a pasted link or a bare token and return the token.
    pub fn resolve_token(&self, input: &str) -> Result<String, AppError> {
        let input = input.trim();
        if input.contains("://") || input.contains('/') {
            self.validate_share_url(input)
        } else if input.is_empty() {
            Err(AppError::validation("Share token cannot be empty"))
        } else {
            Ok(input.to_string())
        }
    }
}

//! Cache key builders.
//!
//! Keys are relative; the Redis provider adds the configured `key_prefix`.

/// Counter of reserved password attempts against a share token.
pub fn attempt_failures(token: &str) -> String {
    format!("attempts:fail:{token}")
}

/// Marker present while a share token is locked out.
pub fn attempt_lockout(token: &str) -> String {
    format!("attempts:lock:{token}")
}

/// Counter of requests one client made against a share token.
pub fn access_requests(client: &str, token: &str) -> String {
    format!("access:{client}:{token}")
}

//! Cache key builders for all Tokenguard cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. Backend prefixes (for example
//! the Redis `key_prefix`) are applied by the provider, not here.

/// Cache key for a blacklisted token id.
pub fn blacklist(jti: &str) -> String {
    format!("blacklist:{jti}")
}

/// Cache key for the identity snapshot of a subject within a scene.
pub fn session(scene: &str, subject: &str) -> String {
    format!("{scene}_{subject}")
}

/// Cache key for the refresh lock of a logical session.
///
/// `payload_hash` is a digest of the token payload so that concurrent
/// refreshes of the same session serialize even when the presented token
/// strings differ.
pub fn refresh_lock(payload_hash: &str) -> String {
    format!("lock:{payload_hash}")
}

/// Cache key holding the token minted when `jti` was refreshed.
pub fn refreshed(jti: &str) -> String {
    format!("refreshed:{jti}")
}

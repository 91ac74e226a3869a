//! Avatar URL derivation
//!
//! Gravatar accepts a SHA-256 digest of the normalised address, so the URL
//! is a pure function of the email and is never stored.

use sha2::{Digest, Sha256};

/// Gravatar endpoint
pub const GRAVATAR_BASE_URL: &str = "https://s.gravatar.com/avatar";

/// Build the avatar URL for an email address
pub fn avatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{}/{}", GRAVATAR_BASE_URL, hex::encode(digest))
}

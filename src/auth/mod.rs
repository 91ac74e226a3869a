//! Authentication for ratesvc
//!
//! Provides:
//! - JWT session token verification (HMAC only)
//! - Cookie extraction and caller identity resolution

pub mod jwt;
pub mod resolver;

pub use jwt::{AuthError, CredentialVerifier, JwtVerifier, UserClaims, UserIdentity};
pub use resolver::{extract_token_from_cookies, IdentityResolver};

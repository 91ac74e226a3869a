//! JWT credential verification
//!
//! Session tokens are issued by the account service and signed with a
//! shared HMAC key. Only the HMAC family is accepted; a token whose header
//! names any other algorithm is rejected before its signature is checked.

use std::collections::HashSet;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::RatesvcError;

/// Algorithms a session token may be signed with
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Why a credential could not be turned into a caller identity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authentication is not configured: {0}")]
    Configuration(String),

    #[error("missing credential")]
    MissingCredential,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Stable user identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Contact address, used for avatar derivation only
    #[serde(default, alias = "Email")]
    pub email: String,
    /// Expiration time (Unix timestamp), validated when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Verified identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<UserClaims> for UserIdentity {
    fn from(claims: UserClaims) -> Self {
        Self {
            id: claims.id,
            name: claims.name,
            email: claims.email,
        }
    }
}

/// Turns a raw token into a verified identity
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserIdentity, AuthError>;
}

/// HMAC-signed JWT verifier
#[derive(Clone)]
pub struct JwtVerifier {
    secret: Vec<u8>,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier for the given shared key
    ///
    /// Returns an error if the key is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, RatesvcError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(RatesvcError::Config("JWT key must not be empty".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;

        Ok(Self {
            secret: secret.into_bytes(),
            validation,
        })
    }

    /// Sign a token for the given claims (HS256)
    pub fn issue(&self, claims: &UserClaims) -> Result<String, RatesvcError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| RatesvcError::Internal(format!("Failed to sign token: {}", e)))
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &self.validation,
        )
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => AuthError::InvalidSignature,
            _ => AuthError::Malformed(err.to_string()),
        })?;

        if data.claims.id.trim().is_empty() {
            return Err(AuthError::Malformed("token carries no user id".into()));
        }

        Ok(data.claims.into())
    }
}

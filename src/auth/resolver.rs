//! Caller identity resolution from the session cookie

use std::sync::Arc;

use hyper::header::COOKIE;
use hyper::HeaderMap;
use tracing::debug;

use crate::auth::jwt::{AuthError, CredentialVerifier, UserIdentity};

/// Resolves the acting user for a request
///
/// Holds no per-request state; the verifier is fixed at construction.
#[derive(Clone)]
pub struct IdentityResolver {
    cookie_name: String,
    verifier: Option<Arc<dyn CredentialVerifier>>,
}

impl IdentityResolver {
    /// `verifier` is `None` when no signing key is configured; every
    /// resolution then fails with [`AuthError::Configuration`].
    pub fn new(cookie_name: impl Into<String>, verifier: Option<Arc<dyn CredentialVerifier>>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            verifier,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Resolve the caller, failing when no valid credential is present
    pub fn resolve(&self, headers: &HeaderMap) -> Result<UserIdentity, AuthError> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or_else(|| AuthError::Configuration("JWT_KEY not set".into()))?;

        let token = extract_token_from_cookies(headers, &self.cookie_name)
            .ok_or(AuthError::MissingCredential)?;

        verifier.verify(token)
    }

    /// Resolve the caller for read paths, where anonymous access is fine
    pub fn resolve_optional(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        match self.resolve(headers) {
            Ok(identity) => Some(identity),
            Err(AuthError::MissingCredential) => None,
            Err(e) => {
                debug!(error = %e, "Ignoring unusable credential on read");
                None
            }
        }
    }
}

/// Find a cookie value by name across all `Cookie` headers.
pub fn extract_token_from_cookies<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

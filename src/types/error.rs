//! Error types for ratesvc
//!
//! Every failure the core can produce maps onto one variant here. The route
//! layer turns a `RatesvcError` into the `{code, message}` error envelope.

use hyper::StatusCode;

use crate::auth::AuthError;

/// Main error type for ratesvc operations
#[derive(Debug, thiserror::Error)]
pub enum RatesvcError {
    /// Malformed or missing required input
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credential on a write
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not permitted to act on the resource
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    /// Persistence layer failure
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RatesvcError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to a client.
    ///
    /// Server-side failures collapse to a generic message; the detail is
    /// logged where the error is turned into a response.
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<std::io::Error> for RatesvcError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for RatesvcError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("could not parse request body: {}", err))
    }
}

impl From<mongodb::error::Error> for RatesvcError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for RatesvcError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Database(format!("BSON encoding failed: {}", err))
    }
}

impl From<AuthError> for RatesvcError {
    fn from(err: AuthError) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

/// Result type alias for ratesvc operations
pub type Result<T> = std::result::Result<T, RatesvcError>;

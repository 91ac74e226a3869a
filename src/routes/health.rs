//! Health check endpoints
//!
//! - /live    - liveness probe (is the process serving?)
//! - /ready   - readiness probe (is the item store reachable?)
//! - /version - build information

use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use crate::routes::response::{json_response, FullBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

fn health_response(status: StatusCode, response: &HealthResponse) -> Response<FullBody> {
    let body = serde_json::to_vec(response)
        .unwrap_or_else(|_| br#"{"healthy":false,"error":"Serialization failed"}"#.to_vec());
    json_response(status, body)
}

/// Liveness probe - 200 whenever the server can answer
pub fn liveness_check() -> Response<FullBody> {
    health_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            error: None,
        },
    )
}

/// Readiness probe - 200 only when the store answers a ping
pub async fn readiness_check(state: &AppState) -> Response<FullBody> {
    match state.engagement.store().ping().await {
        Ok(()) => liveness_check(),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            health_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &HealthResponse {
                    healthy: false,
                    version: env!("CARGO_PKG_VERSION"),
                    error: Some("item store unavailable".to_string()),
                },
            )
        }
    }
}

pub fn version_info() -> Response<FullBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "ratesvc",
    };

    let body = serde_json::to_vec(&response)
        .unwrap_or_else(|_| br#"{"version":"unknown","commit":"unknown"}"#.to_vec());
    json_response(StatusCode::OK, body)
}

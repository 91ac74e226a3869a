//! JSON response envelopes
//!
//! Successful responses wrap their payload as `{"data": ...}`; failures are
//! `{"code": <status>, "message": "..."}`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::types::RatesvcError;

pub type FullBody = Full<Bytes>;

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

/// Response with a pre-serialized JSON body
pub fn json_response(status: StatusCode, body: impl Into<Bytes>) -> Response<FullBody> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Wrap a payload in the data envelope
pub fn data_response<T: Serialize>(status: StatusCode, data: T) -> Response<FullBody> {
    match serde_json::to_vec(&DataResponse { data }) {
        Ok(body) => json_response(status, body),
        Err(e) => error_response(RatesvcError::Internal(format!(
            "Failed to serialize response: {}",
            e
        ))),
    }
}

/// Turn an error into the error envelope, logging server-side failures
pub fn error_response(err: RatesvcError) -> Response<FullBody> {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        debug!(status = status.as_u16(), error = %err, "Request rejected");
    }

    let envelope = ErrorResponse {
        code: status.as_u16(),
        message: err.public_message(),
    };
    let body = serde_json::to_vec(&envelope)
        .unwrap_or_else(|_| br#"{"code":500,"message":"internal server error"}"#.to_vec());

    json_response(status, body)
}

//! Comment endpoints
//!
//! - GET    /v1/comments/{repo}/{name}             - list comments
//! - POST   /v1/comments/{repo}/{name}             - add a comment (auth required)
//! - DELETE /v1/comments/{repo}/{name}/{commentId} - delete own comment (auth required)

use hyper::{HeaderMap, Response, StatusCode};
use serde::Deserialize;

use crate::routes::response::{data_response, error_response, FullBody};
use crate::server::AppState;
use crate::types::{RatesvcError, Result};

pub const COMMENTS_PREFIX: &str = "/v1/comments/";

/// Target of a comment route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPath {
    /// "<repo>/<name>"
    pub item_id: String,
    pub comment_id: Option<String>,
}

/// Split a comment route into item key and optional comment id.
///
/// Segments are percent-decoded; empty segments do not match.
pub fn parse_comment_path(path: &str) -> Option<CommentPath> {
    let rest = path.strip_prefix(COMMENTS_PREFIX)?;
    let segments = rest
        .split('/')
        .map(|s| urlencoding::decode(s).map(|decoded| decoded.into_owned()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;

    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    match segments.as_slice() {
        [repo, name] => Some(CommentPath {
            item_id: format!("{}/{}", repo, name),
            comment_id: None,
        }),
        [repo, name, comment_id] => Some(CommentPath {
            item_id: format!("{}/{}", repo, name),
            comment_id: Some(comment_id.clone()),
        }),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub text: String,
}

/// GET /v1/comments/{repo}/{name}
pub async fn handle_list_comments(state: &AppState, item_id: &str) -> Response<FullBody> {
    match state.engagement.list_comments(item_id).await {
        Ok(comments) => data_response(StatusCode::OK, comments),
        Err(e) => error_response(e),
    }
}

/// POST /v1/comments/{repo}/{name}
pub async fn handle_create_comment(
    state: &AppState,
    headers: &HeaderMap,
    item_id: &str,
    body: &[u8],
) -> Response<FullBody> {
    match create_comment(state, headers, item_id, body).await {
        Ok(response) => response,
        Err(e) => error_response(e),
    }
}

async fn create_comment(
    state: &AppState,
    headers: &HeaderMap,
    item_id: &str,
    body: &[u8],
) -> Result<Response<FullBody>> {
    let caller = state.identity.resolve(headers).map_err(RatesvcError::from)?;
    let request: CreateCommentRequest = serde_json::from_slice(body)?;

    let comment = state
        .engagement
        .add_comment(item_id, &request.text, &caller)
        .await?;
    Ok(data_response(StatusCode::CREATED, comment))
}

/// DELETE /v1/comments/{repo}/{name}/{commentId}
pub async fn handle_delete_comment(
    state: &AppState,
    headers: &HeaderMap,
    item_id: &str,
    comment_id: &str,
) -> Response<FullBody> {
    match delete_comment(state, headers, item_id, comment_id).await {
        Ok(response) => response,
        Err(e) => error_response(e),
    }
}

async fn delete_comment(
    state: &AppState,
    headers: &HeaderMap,
    item_id: &str,
    comment_id: &str,
) -> Result<Response<FullBody>> {
    let caller = state.identity.resolve(headers).map_err(RatesvcError::from)?;

    let comment = state
        .engagement
        .delete_comment(item_id, comment_id, &caller)
        .await?;
    Ok(data_response(StatusCode::ACCEPTED, comment))
}

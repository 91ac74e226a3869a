//! Star endpoints
//!
//! - GET /v1/stars - list items with star counts (auth optional)
//! - PUT /v1/stars - star or unstar an item (auth required)

use hyper::{HeaderMap, Response, StatusCode};

use crate::routes::response::{data_response, error_response, FullBody};
use crate::server::AppState;
use crate::services::{StarOutcome, StarRequest};
use crate::types::{RatesvcError, Result};

/// GET /v1/stars
pub async fn handle_list_stars(state: &AppState, headers: &HeaderMap) -> Response<FullBody> {
    let caller = state.identity.resolve_optional(headers);

    match state.engagement.list_items(caller.as_ref()).await {
        Ok(items) => data_response(StatusCode::OK, items),
        Err(e) => error_response(e),
    }
}

/// PUT /v1/stars
pub async fn handle_update_star(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Response<FullBody> {
    match update_star(state, headers, body).await {
        Ok(response) => response,
        Err(e) => error_response(e),
    }
}

async fn update_star(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Response<FullBody>> {
    let caller = state.identity.resolve(headers).map_err(RatesvcError::from)?;
    let request: StarRequest = serde_json::from_slice(body)?;

    let result = state.engagement.set_star(request, &caller).await?;
    let status = match result.outcome {
        StarOutcome::AlreadySatisfied => StatusCode::OK,
        StarOutcome::Created | StarOutcome::Updated => StatusCode::CREATED,
    };

    Ok(data_response(status, result.item))
}

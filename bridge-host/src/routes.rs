//! Page inspection routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bridge_core::TransportId;
use serde_json::json;

use crate::AppState;

/// List live pages.
#[tracing::instrument(name = "list_pages", skip(state))]
pub async fn list_pages(State(state): State<AppState>) -> Response {
    match state.view.pages().await {
        Ok(pages) => Json(json!({ "pages": pages })).into_response(),
        Err(e) => unavailable(&e),
    }
}

/// Snapshot one page.
#[tracing::instrument(name = "get_page", skip(state))]
pub async fn get_page(State(state): State<AppState>, Path(page): Path<String>) -> Response {
    match state.view.inspect(TransportId::from(page)).await {
        Ok(Some(snapshot)) => Json(snapshot).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "page not found" })),
        )
            .into_response(),
        Err(e) => unavailable(&e),
    }
}

fn unavailable(e: &bridge_core::BridgeError) -> Response {
    tracing::warn!(error = %e, "View context unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}

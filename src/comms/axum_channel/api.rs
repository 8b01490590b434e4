//! Axum handlers for `/api/*` routes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::AxumState;
use crate::chat::ChatError;
use crate::session::ExchangeId;

#[derive(Deserialize)]
pub(super) struct MessageRequest {
    message: String,
}

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

/// GET /api/health
pub(super) async fn health(State(state): State<AxumState>) -> Response {
    let body = json!({
        "status": "ok",
        "provider": state.chat.provider_name(),
        "busy": state.chat.is_busy(),
        "exchanges": state.chat.history_len().await,
    });
    (StatusCode::OK, Json(body)).into_response()
}

/// POST /api/message
///
/// Provider failures still answer 200 with the fallback text as `reply`.
pub(super) async fn message(
    State(state): State<AxumState>,
    Json(req): Json<MessageRequest>,
) -> Response {
    debug!(channel_id = %state.channel_id, prompt_len = req.message.len(), "api message");
    match state.chat.submit(&req.message).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(ChatError::Busy) => {
            warn!(channel_id = %state.channel_id, "message rejected: request in flight");
            (StatusCode::CONFLICT, json_error("busy", ChatError::Busy)).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", e)).into_response(),
    }
}

/// POST /api/session/new
pub(super) async fn new_session(State(state): State<AxumState>) -> StatusCode {
    state.chat.new_session().await;
    StatusCode::NO_CONTENT
}

/// GET /api/history
pub(super) async fn history(State(state): State<AxumState>) -> Response {
    (StatusCode::OK, Json(state.chat.list_history().await)).into_response()
}

/// GET /api/history/{id}
pub(super) async fn select(
    State(state): State<AxumState>,
    Path(id): Path<ExchangeId>,
) -> Response {
    match state.chat.select(id).await {
        Ok(exchange) => (StatusCode::OK, Json(exchange)).into_response(),
        Err(ChatError::Session(e)) => (StatusCode::NOT_FOUND, json_error("not_found", e)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, json_error("internal", e)).into_response(),
    }
}

/// GET /api/view
pub(super) async fn view(State(state): State<AxumState>) -> Response {
    (StatusCode::OK, Json(state.chat.view().await)).into_response()
}

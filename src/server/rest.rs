//! HTTP+JSON endpoints of the demo target (`/v1/...`).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use tracing::debug;

use super::store::CancelError;
use super::{plain_text, sse_response, AppState, ExtendedCardAccess};
use crate::types::{SendMessageParams, TaskState};

const PLAIN_TEXT_REPLY: &str = "hello world (this endpoint does not speak HTTP+JSON)";

fn rest_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message.into()}})),
    )
        .into_response()
}

fn parse_send(body: &str) -> Result<SendMessageParams, Response> {
    serde_json::from_str(body)
        .map_err(|e| rest_error(StatusCode::BAD_REQUEST, format!("invalid message body: {e}")))
}

fn bare_stream(events: Vec<Value>) -> Response {
    sse_response(events.iter().map(Value::to_string).collect())
}

/// `POST /v1/message:send`.
pub(super) async fn handle_message_send(State(state): State<Arc<AppState>>, body: String) -> Response {
    if state.answers_plain_text() {
        return plain_text(StatusCode::OK, PLAIN_TEXT_REPLY);
    }
    let params = match parse_send(&body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let task = state.store.create(TaskState::Working, params.message).await;
    debug!(task_id = %task.id, "REST message:send");
    Json(task).into_response()
}

/// `POST /v1/message:stream`.
pub(super) async fn handle_message_stream(State(state): State<Arc<AppState>>, body: String) -> Response {
    if state.answers_plain_text() {
        return plain_text(StatusCode::OK, PLAIN_TEXT_REPLY);
    }
    match parse_send(&body) {
        Ok(p) => bare_stream(state.stream_exchange(p.message).await),
        Err(resp) => resp,
    }
}

/// `GET /v1/tasks/{id}`.
pub(super) async fn handle_get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    if state.answers_plain_text() {
        return plain_text(StatusCode::OK, PLAIN_TEXT_REPLY);
    }
    match state.store.get(&id, None).await {
        Some(task) => Json(task).into_response(),
        None => rest_error(StatusCode::NOT_FOUND, format!("task {id} not found")),
    }
}

/// `POST /v1/tasks/{id}:cancel` and `POST /v1/tasks/{id}:subscribe`.
///
/// The custom verb shares a path segment with the id, so it is split here.
pub(super) async fn handle_task_action(
    State(state): State<Arc<AppState>>,
    Path(segment): Path<String>,
) -> Response {
    if state.answers_plain_text() {
        return plain_text(StatusCode::OK, PLAIN_TEXT_REPLY);
    }
    let Some((id, verb)) = segment.rsplit_once(':') else {
        return rest_error(StatusCode::METHOD_NOT_ALLOWED, "expected tasks/{id}:cancel or :subscribe");
    };

    match verb {
        "cancel" => match state.store.cancel(id).await {
            Ok(task) => Json(task).into_response(),
            Err(CancelError::NotFound) => {
                rest_error(StatusCode::NOT_FOUND, format!("task {id} not found"))
            }
            Err(CancelError::NotCancelable(current)) => rest_error(
                StatusCode::CONFLICT,
                format!("task {id} cannot be canceled in state {current:?}"),
            ),
        },
        "subscribe" => match state.resubscribe_events(id).await {
            Some(events) => bare_stream(events),
            None => rest_error(StatusCode::NOT_FOUND, format!("task {id} not found")),
        },
        other => rest_error(StatusCode::NOT_FOUND, format!("unknown task action '{other}'")),
    }
}

/// `GET /v1/card`.
pub(super) async fn handle_extended_card(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if state.answers_plain_text() {
        return plain_text(StatusCode::OK, PLAIN_TEXT_REPLY);
    }
    match state.extended_card_access(&headers) {
        ExtendedCardAccess::Granted => Json(&state.extended_card).into_response(),
        ExtendedCardAccess::Unauthorized => {
            rest_error(StatusCode::UNAUTHORIZED, "authentication required")
        }
        ExtendedCardAccess::NotConfigured => {
            rest_error(StatusCode::NOT_FOUND, "extended card not configured")
        }
    }
}

//! JSON-RPC 2.0 endpoint of the demo target.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::store::CancelError;
use super::{plain_text, sse_response, AppState, DemoMode, ExtendedCardAccess};
use crate::error::{
    AUTHENTICATED_EXTENDED_CARD_NOT_CONFIGURED, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR, PUSH_NOTIFICATION_NOT_SUPPORTED, TASK_NOT_CANCELABLE,
    TASK_NOT_FOUND,
};
use crate::types::{
    JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse, SendMessageParams,
    TaskPushNotificationConfig, TaskState,
};
use crate::utils::constants::*;

/// Generic server error returned for unknown methods in `mixed` mode.
const SERVER_ERROR: i64 = -32000;

type RpcResult = Result<Value, JsonRpcError>;

/// Params of the task-addressed methods.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskIdParams {
    id: String,
    #[serde(default)]
    history_length: Option<usize>,
    #[serde(default)]
    push_notification_config_id: Option<String>,
}

fn parse<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))
}

fn to_result<T: Serialize>(value: &T) -> RpcResult {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {e}")))
}

fn task_not_found(task_id: &str) -> JsonRpcError {
    JsonRpcError::new(TASK_NOT_FOUND, format!("Task not found: {task_id}"))
}

fn reply(id: Option<JsonRpcId>, result: RpcResult) -> Response {
    let body = match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(error) => JsonRpcResponse::error(id, error),
    };
    Json(body).into_response()
}

/// SSE response whose events are JSON-RPC success envelopes.
fn stream_reply(id: Option<JsonRpcId>, events: Vec<Value>) -> Response {
    let frames = events
        .into_iter()
        .filter_map(|event| serde_json::to_string(&JsonRpcResponse::success(id.clone(), event)).ok())
        .collect();
    sse_response(frames)
}

/// `POST /a2a/v1/jsonrpc`.
pub(super) async fn handle_jsonrpc(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if state.answers_plain_text() {
        return plain_text(StatusCode::OK, "hello world (this endpoint does not speak JSON-RPC)");
    }

    let value: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            return reply(
                None,
                Err(JsonRpcError::new(PARSE_ERROR, format!("Parse error: {e}"))),
            )
        }
    };
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            return reply(
                None,
                Err(JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {e}"))),
            )
        }
    };
    if request.jsonrpc != "2.0" {
        return reply(
            request.id,
            Err(JsonRpcError::new(
                INVALID_REQUEST,
                "Invalid JSON-RPC version, must be \"2.0\"",
            )),
        );
    }

    debug!(method = %request.method, mode = %state.mode, "JSON-RPC request received");
    let JsonRpcRequest { id, method, params, .. } = request;

    match method.as_str() {
        METHOD_MESSAGE_SEND => reply(id, message_send(&state, params).await),
        METHOD_MESSAGE_STREAM => match parse::<SendMessageParams>(params) {
            Ok(p) => stream_reply(id, state.stream_exchange(p.message).await),
            Err(e) => reply(id, Err(e)),
        },
        METHOD_TASKS_GET => reply(id, tasks_get(&state, params).await),
        METHOD_TASKS_CANCEL => reply(id, tasks_cancel(&state, params).await),
        METHOD_TASKS_RESUBSCRIBE => match parse::<TaskIdParams>(params) {
            Ok(p) => match state.resubscribe_events(&p.id).await {
                Some(events) => stream_reply(id, events),
                None => reply(id, Err(task_not_found(&p.id))),
            },
            Err(e) => reply(id, Err(e)),
        },
        METHOD_PUSH_SET | METHOD_PUSH_GET | METHOD_PUSH_LIST | METHOD_PUSH_DELETE => {
            reply(id, push_config(&state, &method, params).await)
        }
        METHOD_EXTENDED_CARD => extended_card(&state, id, &headers),
        other => {
            warn!(method = %other, "unknown JSON-RPC method");
            let code = if state.mode == DemoMode::Mixed {
                SERVER_ERROR
            } else {
                METHOD_NOT_FOUND
            };
            reply(
                id,
                Err(JsonRpcError::new(code, format!("Method not found: {other}"))),
            )
        }
    }
}

async fn message_send(state: &AppState, params: Option<Value>) -> RpcResult {
    let params: SendMessageParams = parse(params)?;
    let task = state.store.create(TaskState::Working, params.message).await;
    to_result(&task)
}

async fn tasks_get(state: &AppState, params: Option<Value>) -> RpcResult {
    let params: TaskIdParams = parse(params)?;
    match state.store.get(&params.id, params.history_length).await {
        Some(task) => to_result(&task),
        None => Err(task_not_found(&params.id)),
    }
}

async fn tasks_cancel(state: &AppState, params: Option<Value>) -> RpcResult {
    let params: TaskIdParams = parse(params)?;
    if state.mode == DemoMode::Mixed {
        return Err(JsonRpcError::new(
            TASK_NOT_CANCELABLE,
            "Task cannot be canceled",
        ));
    }
    match state.store.cancel(&params.id).await {
        Ok(task) => to_result(&task),
        Err(CancelError::NotFound) => Err(task_not_found(&params.id)),
        Err(CancelError::NotCancelable(current)) => Err(JsonRpcError::new(
            TASK_NOT_CANCELABLE,
            format!("Task cannot be canceled in state {current:?}"),
        )),
    }
}

async fn push_config(state: &AppState, method: &str, params: Option<Value>) -> RpcResult {
    if state.mode == DemoMode::Mixed {
        return Err(JsonRpcError::new(
            PUSH_NOTIFICATION_NOT_SUPPORTED,
            "Push Notification is not supported",
        ));
    }

    match method {
        METHOD_PUSH_SET => {
            let params: TaskPushNotificationConfig = parse(params)?;
            let saved = state
                .store
                .set_push(&params.task_id, params.push_notification_config)
                .await
                .ok_or_else(|| task_not_found(&params.task_id))?;
            to_result(&TaskPushNotificationConfig {
                task_id: params.task_id,
                push_notification_config: saved,
            })
        }
        METHOD_PUSH_GET => {
            let params: TaskIdParams = parse(params)?;
            let config = state
                .store
                .get_push(&params.id, params.push_notification_config_id.as_deref())
                .await
                .ok_or_else(|| {
                    JsonRpcError::new(
                        INVALID_PARAMS,
                        format!("No push notification config for task {}", params.id),
                    )
                })?;
            to_result(&TaskPushNotificationConfig {
                task_id: params.id,
                push_notification_config: config,
            })
        }
        METHOD_PUSH_LIST => {
            let params: TaskIdParams = parse(params)?;
            let configs: Vec<TaskPushNotificationConfig> = state
                .store
                .list_push(&params.id)
                .await
                .into_iter()
                .map(|config| TaskPushNotificationConfig {
                    task_id: params.id.clone(),
                    push_notification_config: config,
                })
                .collect();
            to_result(&configs)
        }
        _ => {
            let params: TaskIdParams = parse(params)?;
            let config_id = params.push_notification_config_id.ok_or_else(|| {
                JsonRpcError::new(INVALID_PARAMS, "missing 'pushNotificationConfigId'")
            })?;
            if state.store.delete_push(&params.id, &config_id).await {
                Ok(Value::Null)
            } else {
                Err(JsonRpcError::new(
                    INVALID_PARAMS,
                    format!("No push notification config {config_id}"),
                ))
            }
        }
    }
}

fn extended_card(state: &AppState, id: Option<JsonRpcId>, headers: &HeaderMap) -> Response {
    match state.extended_card_access(headers) {
        ExtendedCardAccess::Granted => reply(id, Ok(state.extended_card.clone())),
        ExtendedCardAccess::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(JsonRpcResponse::error(
                id,
                JsonRpcError::new(INVALID_REQUEST, "Authentication required"),
            )),
        )
            .into_response(),
        ExtendedCardAccess::NotConfigured => reply(
            id,
            Err(JsonRpcError::new(
                AUTHENTICATED_EXTENDED_CARD_NOT_CONFIGURED,
                "Authenticated extended card is not configured",
            )),
        ),
    }
}

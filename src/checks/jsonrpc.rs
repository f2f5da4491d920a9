//! JSON-RPC compliance rule set (`RPC-0xx`).
//!
//! A sequential scenario against one endpoint: unknown-method rejection,
//! `message/send`, then (given a task handle) `tasks/get`, `tasks/cancel` and
//! push-notification config CRUD, then streaming with resubscribe, and finally
//! the authenticated extended card. Every step converts its own failure into
//! exactly one ERROR outcome; steps whose precondition is unmet are omitted.

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::{stream_result, HttpResponse, JsonRpcClient, SseCollection, Transport};
use crate::config::Settings;
use crate::error::{
    code_name, ProbeError, ProbeResult, NOT_CANCELABLE_CODES, PUSH_UNSUPPORTED_CODES, UNKNOWN_METHOD_CODES,
};
use crate::model::{CheckOutcome, Section};
use crate::types::{
    AgentCard, JsonRpcReply, JsonRpcRequest, PushNotificationAuthenticationInfo,
    PushNotificationConfig, SendMessageParams, TaskPushNotificationConfig,
};
use crate::utils::constants::*;
use crate::utils::json::{kind_and_id, task_id_of_stream_result};

/// Title of the section this rule set produces.
pub const SECTION_TITLE: &str = "JSON-RPC";

/// What the descriptor says about optional RPC features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpcProfile {
    /// `capabilities.streaming`; only an explicit `false` skips streaming.
    pub streaming: Option<bool>,
    /// `supportsAuthenticatedExtendedCard` is truthy.
    pub extended_card: bool,
}

impl RpcProfile {
    pub fn from_card(card: &AgentCard) -> Self {
        Self {
            streaming: card.capabilities.streaming,
            extended_card: card.supports_authenticated_extended_card == Some(true),
        }
    }

    /// Profile for an endpoint probed without a descriptor.
    pub fn ping() -> Self {
        Self {
            streaming: Some(false),
            extended_card: false,
        }
    }
}

/// Runs the JSON-RPC scenario against one endpoint.
pub struct JsonRpcChecks<'a> {
    client: JsonRpcClient<'a>,
    settings: &'a Settings,
    profile: RpcProfile,
}

impl<'a> JsonRpcChecks<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        settings: &'a Settings,
        jsonrpc_url: impl Into<String>,
        profile: RpcProfile,
    ) -> Self {
        Self {
            client: JsonRpcClient::new(transport, jsonrpc_url),
            settings,
            profile,
        }
    }

    pub fn url(&self) -> &str {
        self.client.url()
    }

    /// Run the whole scenario and collect one `JSON-RPC` section.
    pub async fn run_section(&self) -> Section {
        info!(url = %self.url(), profile = ?self.profile, "JSON-RPC checks");
        let mut s = Section::new(SECTION_TITLE);
        s.push(self.method_not_found().await);

        let (send, task_id) = self.message_send_roundtrip().await;
        s.extend(send);

        if let Some(task_id) = task_id {
            s.push(self.tasks_get(&task_id).await);
            s.push(self.tasks_cancel(&task_id).await);
            s.extend(self.push_notifications(&task_id).await);
        }

        s.extend(self.streaming_and_resubscribe().await);
        s.push(self.extended_card().await);
        s
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.settings.stream_timeout
    }

    async fn call(&self, payload: &JsonRpcRequest) -> ProbeResult<(JsonRpcReply, HttpResponse)> {
        self.client.call_and_parse(&payload.to_value()).await
    }

    // ---------------------------------------------------------------------
    // Unknown method
    // ---------------------------------------------------------------------

    async fn method_not_found(&self) -> CheckOutcome {
        let payload = json!({"jsonrpc": "2.0", "id": "test", "method": METHOD_UNKNOWN});
        match self.client.call_and_parse(&payload).await {
            Ok((JsonRpcReply::Error(err), _)) if UNKNOWN_METHOD_CODES.contains(&err.code) => {
                CheckOutcome::pass(
                    "RPC-001",
                    format!(
                        "unknown method rejected with acceptable JSON-RPC error ({}, {})",
                        err.code,
                        code_name(err.code)
                    ),
                )
            }
            Ok((JsonRpcReply::Error(err), _)) => CheckOutcome::error(
                "RPC-001",
                format!("unexpected error code {} for unknown method ({})", err.code, err.message),
            )
            .with_detail(json!({ "code": err.code })),
            Ok((JsonRpcReply::Success(_), _)) => {
                CheckOutcome::error("RPC-001", "expected error for unknown method, got a result")
            }
            Err(e) => CheckOutcome::error("RPC-001", format!("unknown method probe failed: {e}")),
        }
    }

    // ---------------------------------------------------------------------
    // message/send
    // ---------------------------------------------------------------------

    /// Returns the outcomes and, when the result is a task with an id, the handle.
    async fn message_send_roundtrip(&self) -> (Vec<CheckOutcome>, Option<String>) {
        let params = SendMessageParams::text("msg-1", "ping").with_blocking(false);
        let payload = match JsonRpcRequest::with_params("1", METHOD_MESSAGE_SEND, &params) {
            Ok(p) => p.to_value(),
            Err(e) => {
                return (
                    vec![CheckOutcome::error("RPC-010", format!("message/send failed: {e}"))],
                    None,
                )
            }
        };

        let raw = match self.client.call_raw(&payload).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "message/send transport failure");
                return (
                    vec![CheckOutcome::error("RPC-010", format!("message/send failed: {e}"))],
                    None,
                );
            }
        };

        let content_type = if raw.is_json() {
            CheckOutcome::pass("RPC-011", format!("Content-Type {}", raw.content_type()))
        } else {
            let ct = raw.content_type();
            CheckOutcome::error(
                "RPC-011",
                format!("Content-Type not JSON ({})", if ct.is_empty() { "missing" } else { ct }),
            )
        };

        let reply = match crate::client::parse_reply(&raw) {
            Ok(reply) => reply,
            Err(e) => {
                return (
                    vec![
                        CheckOutcome::error("RPC-010", format!("message/send failed: {e}")),
                        content_type,
                    ],
                    None,
                )
            }
        };

        let result = match reply {
            JsonRpcReply::Error(err) => {
                return (
                    vec![
                        CheckOutcome::error("RPC-010", format!("message/send rejected: {}", ProbeError::from(err))),
                        content_type,
                    ],
                    None,
                )
            }
            JsonRpcReply::Success(result) => result,
        };

        match kind_and_id(&result) {
            (Some("message"), _) => (
                vec![
                    CheckOutcome::pass("RPC-010", "message/send returned Message"),
                    content_type,
                ],
                None,
            ),
            (Some("task"), id) => {
                let handle = id.filter(|id| !id.is_empty()).map(String::from);
                debug!(task_id = ?handle, "message/send returned Task");
                (
                    vec![
                        CheckOutcome::pass(
                            "RPC-010",
                            format!("message/send returned Task ({})", id.unwrap_or("no id")),
                        ),
                        content_type,
                    ],
                    handle,
                )
            }
            (kind, _) => (
                vec![
                    CheckOutcome::error(
                        "RPC-010",
                        format!(
                            "unexpected result shape (type={}, kind={})",
                            crate::utils::json::type_name(&result),
                            kind.unwrap_or("none")
                        ),
                    ),
                    content_type,
                ],
                None,
            ),
        }
    }

    // ---------------------------------------------------------------------
    // tasks/get, tasks/cancel
    // ---------------------------------------------------------------------

    async fn tasks_get(&self, task_id: &str) -> CheckOutcome {
        let req = JsonRpcRequest::new(
            "2",
            METHOD_TASKS_GET,
            Some(json!({"id": task_id, "historyLength": 1})),
        );
        match self.call(&req).await {
            Err(e) => CheckOutcome::error("RPC-020", format!("tasks/get failed: {e}")),
            Ok((JsonRpcReply::Error(err), _)) => {
                CheckOutcome::error("RPC-020", format!("tasks/get rejected: {}", ProbeError::from(err)))
            }
            Ok((JsonRpcReply::Success(result), _)) => match kind_and_id(&result) {
                (Some("task"), Some(id)) if id == task_id => {
                    CheckOutcome::pass("RPC-020", format!("tasks/get returned Task ({id})"))
                }
                (kind, id) => CheckOutcome::error(
                    "RPC-020",
                    format!(
                        "tasks/get unexpected result (kind={}, id={}; expected task {task_id})",
                        kind.unwrap_or("none"),
                        id.unwrap_or("none")
                    ),
                ),
            },
        }
    }

    async fn tasks_cancel(&self, task_id: &str) -> CheckOutcome {
        let req = JsonRpcRequest::new("3", METHOD_TASKS_CANCEL, Some(json!({"id": task_id})));
        match self.call(&req).await {
            Err(e) => CheckOutcome::error("RPC-021", format!("tasks/cancel failed: {e}")),
            Ok((JsonRpcReply::Error(err), _)) if NOT_CANCELABLE_CODES.contains(&err.code) => {
                CheckOutcome::pass("RPC-021", format!("task not cancelable ({})", err.code))
            }
            Ok((JsonRpcReply::Error(err), _)) => {
                CheckOutcome::error("RPC-021", format!("tasks/cancel rejected: {}", ProbeError::from(err)))
            }
            Ok((JsonRpcReply::Success(result), _)) => match kind_and_id(&result) {
                (Some("task"), _) => CheckOutcome::pass("RPC-021", "tasks/cancel returned Task"),
                (kind, _) => CheckOutcome::error(
                    "RPC-021",
                    format!("tasks/cancel unexpected result (kind={})", kind.unwrap_or("none")),
                ),
            },
        }
    }

    // ---------------------------------------------------------------------
    // Push notification config CRUD
    // ---------------------------------------------------------------------

    /// Score one push-config call. Unsupported codes are tolerated.
    fn push_outcome(
        code: &str,
        op: &str,
        result: ProbeResult<(JsonRpcReply, HttpResponse)>,
    ) -> (CheckOutcome, Option<Value>) {
        match result {
            Err(e) => (
                CheckOutcome::error(code, format!("push {op} failed: {e}")),
                None,
            ),
            Ok((JsonRpcReply::Error(err), _)) if PUSH_UNSUPPORTED_CODES.contains(&err.code) => (
                CheckOutcome::pass(
                    code,
                    format!("push {op} not supported ({}, {})", err.code, code_name(err.code)),
                ),
                None,
            ),
            Ok((JsonRpcReply::Error(err), _)) => (
                CheckOutcome::error(code, format!("push {op} rejected: {}", ProbeError::from(err))),
                None,
            ),
            Ok((JsonRpcReply::Success(result), _)) => (
                CheckOutcome::pass(code, format!("pushNotificationConfig {op} OK")),
                Some(result),
            ),
        }
    }

    async fn push_notifications(&self, task_id: &str) -> Vec<CheckOutcome> {
        let mut out = Vec::new();

        let config = TaskPushNotificationConfig {
            task_id: task_id.to_string(),
            push_notification_config: PushNotificationConfig {
                id: None,
                url: PUSH_WEBHOOK_URL.to_string(),
                token: Some("a2a-check-token".to_string()),
                authentication: Some(PushNotificationAuthenticationInfo {
                    schemes: vec!["Bearer".to_string()],
                    credentials: None,
                }),
            },
        };
        let set = match JsonRpcRequest::with_params("push-1", METHOD_PUSH_SET, &config) {
            Ok(req) => self.call(&req).await,
            Err(e) => Err(e),
        };
        let (outcome, result) = Self::push_outcome("RPC-040", "set", set);
        out.push(outcome);

        let config_id = result
            .as_ref()
            .and_then(|r| r.get("pushNotificationConfig"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(String::from);

        let mut get_params = json!({"id": task_id});
        if let Some(id) = &config_id {
            get_params["pushNotificationConfigId"] = json!(id);
        }
        let get = self
            .call(&JsonRpcRequest::new("push-2", METHOD_PUSH_GET, Some(get_params)))
            .await;
        out.push(Self::push_outcome("RPC-041", "get", get).0);

        let list = self
            .call(&JsonRpcRequest::new(
                "push-3",
                METHOD_PUSH_LIST,
                Some(json!({"id": task_id})),
            ))
            .await;
        out.push(Self::push_outcome("RPC-042", "list", list).0);

        match config_id {
            Some(id) => {
                let delete = self
                    .call(&JsonRpcRequest::new(
                        "push-4",
                        METHOD_PUSH_DELETE,
                        Some(json!({"id": task_id, "pushNotificationConfigId": id})),
                    ))
                    .await;
                out.push(Self::push_outcome("RPC-043", "delete", delete).0);
            }
            None => out.push(CheckOutcome::pass(
                "RPC-043",
                "push delete skipped (no config id returned by set)",
            )),
        }

        out
    }

    // ---------------------------------------------------------------------
    // Streaming
    // ---------------------------------------------------------------------

    async fn streaming_and_resubscribe(&self) -> Vec<CheckOutcome> {
        if self.profile.streaming == Some(false) {
            return vec![CheckOutcome::pass(
                "RPC-030",
                "streaming not declared; skipping stream test",
            )];
        }

        let params = SendMessageParams::text("msg-stream-1", "stream test");
        let collected = match self.collect(METHOD_MESSAGE_STREAM, &params).await {
            Ok(c) => c,
            Err(e) => {
                return vec![CheckOutcome::error(
                    "RPC-030",
                    format!("message/stream failed: {e}"),
                )]
            }
        };

        let mut out = Vec::new();
        if collected.events.is_empty() {
            out.push(CheckOutcome::error("RPC-030", no_events_message("message/stream", &collected)));
            return out;
        }
        out.push(CheckOutcome::pass(
            "RPC-030",
            format!("received {} SSE event(s)", collected.events.len()),
        ));

        let task_id = collected
            .events
            .iter()
            .filter_map(stream_result)
            .find_map(|r| task_id_of_stream_result(&r));
        let Some(task_id) = task_id else {
            out.push(CheckOutcome::warn(
                "RPC-031",
                "could not extract taskId from SSE events; skipping resubscribe",
            ));
            return out;
        };
        out.push(CheckOutcome::pass(
            "RPC-031",
            format!("taskId {task_id} extracted from SSE events"),
        ));

        let params = json!({"id": task_id});
        out.push(match self.collect(METHOD_TASKS_RESUBSCRIBE, &params).await {
            Ok(c) if !c.events.is_empty() => CheckOutcome::pass(
                "RPC-032",
                format!("tasks/resubscribe yielded {} event(s)", c.events.len()),
            ),
            Ok(c) => CheckOutcome::error("RPC-032", no_events_message("tasks/resubscribe", &c)),
            Err(e) => CheckOutcome::error("RPC-032", format!("tasks/resubscribe failed: {e}")),
        });
        out
    }

    async fn collect<P: serde::Serialize>(
        &self,
        method: &str,
        params: &P,
    ) -> ProbeResult<SseCollection> {
        self.client
            .collect_stream(method, params, self.deadline())
            .await
    }

    /// Stand-alone `RPC-STREAM` probe: at least one event before the deadline.
    pub async fn stream_probe(&self, text: &str) -> CheckOutcome {
        match self.client.stream_text(text, self.deadline()).await {
            Ok(c) if !c.events.is_empty() => CheckOutcome::pass(
                "RPC-STREAM",
                format!("received {} SSE event(s)", c.events.len()),
            )
            .with_detail(json!({ "events": c.events })),
            Ok(c) => CheckOutcome::error("RPC-STREAM", no_events_message("message/stream", &c)),
            Err(e) => CheckOutcome::error("RPC-STREAM", format!("message/stream failed: {e}")),
        }
    }

    // ---------------------------------------------------------------------
    // Authenticated extended card
    // ---------------------------------------------------------------------

    async fn extended_card(&self) -> CheckOutcome {
        if !self.profile.extended_card {
            return CheckOutcome::pass("RPC-050", "extended card not declared; skipping");
        }

        let payload = json!({"jsonrpc": "2.0", "id": "ac-1", "method": METHOD_EXTENDED_CARD});
        let resp = match self.client.call_raw_anonymous(&payload).await {
            Ok(resp) => resp,
            Err(e) => return CheckOutcome::error("RPC-050", format!("extended card failed: {e}")),
        };

        if matches!(resp.status, 401 | 403) {
            return CheckOutcome::pass(
                "RPC-050",
                format!(
                    "extended card returned HTTP {} (expected without auth)",
                    resp.status
                ),
            );
        }

        let body = match resp.json() {
            Ok(body) => body,
            Err(_) => {
                return CheckOutcome::error(
                    "RPC-050",
                    format!("extended card response not JSON (HTTP {})", resp.status),
                )
            }
        };

        let result = match JsonRpcReply::from_value(&body) {
            Ok(JsonRpcReply::Success(result)) => result,
            Ok(JsonRpcReply::Error(err)) => {
                return CheckOutcome::error(
                    "RPC-050",
                    format!("extended card rejected: {}", ProbeError::from(err)),
                )
            }
            Err(e) => {
                return CheckOutcome::error(
                    "RPC-050",
                    format!("extended card invalid JSON-RPC payload: {e}"),
                )
            }
        };

        if !result.is_object() {
            return CheckOutcome::error("RPC-050", "extended card result not an object");
        }

        match AgentCard::validate(&result) {
            Ok(_) => CheckOutcome::pass("RPC-050", "extended card OK (validated AgentCard)"),
            Err(errors) => {
                let listed: Vec<String> = errors.iter().map(ToString::to_string).collect();
                CheckOutcome::error(
                    "RPC-050",
                    format!("extended card invalid AgentCard: [{}]", listed.join("; ")),
                )
            }
        }
    }
}

fn no_events_message(step: &str, collected: &SseCollection) -> String {
    match (&collected.error, collected.timed_out) {
        (Some(e), _) => format!("{step} yielded no SSE events ({e})"),
        (None, true) => format!("{step} yielded no SSE events before the stream deadline"),
        (None, false) => format!("{step} yielded no SSE events"),
    }
}

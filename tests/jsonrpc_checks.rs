//! JSON-RPC rule set against scripted endpoints.

mod common;

use a2a_check::checks::{JsonRpcChecks, RpcProfile};
use a2a_check::client::{HttpResponse, SseEvent};
use a2a_check::model::{Section, Severity};
use a2a_check::utils::constants::*;
use a2a_check::Settings;
use common::{json_ok, rpc_result_envelope, task_value, ScriptedTransport};
use serde_json::json;

const URL: &str = "http://agent.test/rpc";

async fn run(transport: &ScriptedTransport, profile: RpcProfile) -> Section {
    let settings = Settings::default();
    JsonRpcChecks::new(transport, &settings, URL, profile)
        .run_section()
        .await
}

fn outcome<'a>(section: &'a Section, code: &'a str) -> &'a a2a_check::CheckOutcome {
    section
        .find(code)
        .next()
        .unwrap_or_else(|| panic!("no {code} outcome in {section:?}"))
}

/// A server that implements every non-streaming method.
fn full_server() -> ScriptedTransport {
    ScriptedTransport::new()
        .rpc_error(METHOD_UNKNOWN, -32601, "Method not found")
        .rpc_result(METHOD_MESSAGE_SEND, task_value("t-1", "submitted"))
        .rpc_result(METHOD_TASKS_GET, task_value("t-1", "working"))
        .rpc_result(METHOD_TASKS_CANCEL, task_value("t-1", "canceled"))
        .rpc_result(
            METHOD_PUSH_SET,
            json!({"taskId": "t-1", "pushNotificationConfig": {"id": "cfg-1", "url": PUSH_WEBHOOK_URL}}),
        )
        .rpc_result(
            METHOD_PUSH_GET,
            json!({"taskId": "t-1", "pushNotificationConfig": {"id": "cfg-1", "url": PUSH_WEBHOOK_URL}}),
        )
        .rpc_result(METHOD_PUSH_LIST, json!([]))
        .rpc_result(METHOD_PUSH_DELETE, json!(null))
}

#[tokio::test]
async fn conforming_endpoint_passes_every_step() {
    let transport = full_server();
    let section = run(&transport, RpcProfile::ping()).await;

    assert!(!section.has_failures(), "{section:?}");
    assert!(!section.has_warnings());
    let codes: Vec<&str> = section.outcomes.iter().map(|o| o.rule_code.as_str()).collect();
    assert_eq!(
        codes,
        [
            "RPC-001", "RPC-010", "RPC-011", "RPC-020", "RPC-021", "RPC-040", "RPC-041",
            "RPC-042", "RPC-043", "RPC-030", "RPC-050"
        ]
    );
    assert!(transport.called(&format!("POST {METHOD_PUSH_DELETE}")));
}

#[tokio::test]
async fn method_not_found_code_passes() {
    let transport = full_server();
    let section = run(&transport, RpcProfile::ping()).await;
    let o = outcome(&section, "RPC-001");
    assert!(o.passed);
    assert!(o.message.contains("-32601"));
}

#[tokio::test]
async fn generic_server_error_for_unknown_method_fails() {
    let transport = full_server().rpc_error(METHOD_UNKNOWN, -32000, "Server error");
    let section = run(&transport, RpcProfile::ping()).await;
    let o = outcome(&section, "RPC-001");
    assert!(!o.passed);
    assert_eq!(o.severity, Severity::Error);
    assert_eq!(o.detail.as_ref().unwrap()["code"], -32000);
}

#[tokio::test]
async fn result_for_unknown_method_fails() {
    let transport = full_server().rpc_result(METHOD_UNKNOWN, json!({}));
    let section = run(&transport, RpcProfile::ping()).await;
    assert!(!outcome(&section, "RPC-001").passed);
}

#[tokio::test]
async fn streaming_false_never_opens_a_stream() {
    let transport = full_server();
    let section = run(&transport, RpcProfile::ping()).await;

    let o = outcome(&section, "RPC-030");
    assert!(o.passed);
    assert!(o.message.contains("skipping"));
    assert!(!transport.called("SSE"));
}

#[tokio::test]
async fn message_result_skips_task_steps() {
    let transport = full_server().rpc_result(
        METHOD_MESSAGE_SEND,
        json!({"kind": "message", "messageId": "m-1", "role": "agent", "parts": []}),
    );
    let section = run(&transport, RpcProfile::ping()).await;

    assert!(outcome(&section, "RPC-010").passed);
    for code in ["RPC-020", "RPC-021", "RPC-040", "RPC-041", "RPC-042", "RPC-043"] {
        assert!(section.find(code).next().is_none(), "{code} should be omitted");
    }
    assert!(!transport.called(&format!("POST {METHOD_TASKS_GET}")));
    assert!(!transport.called(&format!("POST {METHOD_PUSH_SET}")));
}

#[tokio::test]
async fn unexpected_send_shape_is_one_error() {
    let transport = full_server().rpc_result(METHOD_MESSAGE_SEND, json!("hello"));
    let section = run(&transport, RpcProfile::ping()).await;

    let o = outcome(&section, "RPC-010");
    assert!(!o.passed);
    assert!(o.message.contains("type=string"));
    assert_eq!(section.find("RPC-010").count(), 1);
    assert!(section.find("RPC-020").next().is_none());
}

#[tokio::test]
async fn non_json_content_type_is_reported_separately() {
    let body = rpc_result_envelope(task_value("t-1", "submitted")).to_string();
    let transport = full_server().on_post(
        METHOD_MESSAGE_SEND,
        HttpResponse::new(200, Some("text/plain"), body),
    );
    let section = run(&transport, RpcProfile::ping()).await;

    assert!(outcome(&section, "RPC-010").passed);
    let ct = outcome(&section, "RPC-011");
    assert!(!ct.passed);
    assert!(ct.message.contains("text/plain"));
    assert!(outcome(&section, "RPC-020").passed);
}

#[tokio::test]
async fn transport_failure_on_send_is_one_error() {
    let transport = ScriptedTransport::new().rpc_error(METHOD_UNKNOWN, -32601, "nope");
    let section = run(&transport, RpcProfile::ping()).await;

    let send: Vec<_> = section.find("RPC-010").collect();
    assert_eq!(send.len(), 1);
    assert!(!send[0].passed);
    assert!(section.find("RPC-011").next().is_none());
}

#[tokio::test]
async fn task_id_mismatch_on_get_fails() {
    let transport = full_server().rpc_result(METHOD_TASKS_GET, task_value("other", "working"));
    let section = run(&transport, RpcProfile::ping()).await;
    let o = outcome(&section, "RPC-020");
    assert!(!o.passed);
    assert!(o.message.contains("expected task t-1"));
}

#[tokio::test]
async fn not_cancelable_is_accepted() {
    let transport = full_server().rpc_error(METHOD_TASKS_CANCEL, -32002, "Task cannot be canceled");
    let section = run(&transport, RpcProfile::ping()).await;
    assert!(outcome(&section, "RPC-021").passed);

    let transport = full_server().rpc_error(METHOD_TASKS_CANCEL, -32001, "Task not found");
    let section = run(&transport, RpcProfile::ping()).await;
    assert!(!outcome(&section, "RPC-021").passed);
}

#[tokio::test]
async fn unsupported_push_set_still_evaluates_get_and_list() {
    let transport = full_server()
        .rpc_error(METHOD_PUSH_SET, -32601, "Method not found")
        .rpc_error(METHOD_PUSH_GET, -32003, "Push Notification is not supported")
        .rpc_error(METHOD_PUSH_LIST, -32004, "Unsupported");
    let section = run(&transport, RpcProfile::ping()).await;

    for code in ["RPC-040", "RPC-041", "RPC-042", "RPC-043"] {
        assert!(outcome(&section, code).passed, "{code}");
    }
    assert!(outcome(&section, "RPC-043").message.contains("skipped"));
    assert!(transport.called(&format!("POST {METHOD_PUSH_GET}")));
    assert!(transport.called(&format!("POST {METHOD_PUSH_LIST}")));
    assert!(!transport.called(&format!("POST {METHOD_PUSH_DELETE}")));
}

#[tokio::test]
async fn push_error_outside_allowlist_fails() {
    let transport = full_server().rpc_error(METHOD_PUSH_LIST, -32603, "Internal error");
    let section = run(&transport, RpcProfile::ping()).await;
    assert!(!outcome(&section, "RPC-042").passed);
    assert!(outcome(&section, "RPC-041").passed);
}

#[tokio::test]
async fn error_replies_name_code_and_message() {
    let transport = full_server()
        .rpc_error(METHOD_TASKS_GET, -32001, "Task not found")
        .rpc_error(METHOD_TASKS_CANCEL, -32603, "cancel exploded")
        .rpc_error(METHOD_PUSH_LIST, -32603, "Internal error");
    let section = run(&transport, RpcProfile::ping()).await;

    assert_eq!(
        outcome(&section, "RPC-020").message,
        "tasks/get rejected: JSON-RPC error -32001: Task not found"
    );
    assert_eq!(
        outcome(&section, "RPC-021").message,
        "tasks/cancel rejected: JSON-RPC error -32603: cancel exploded"
    );
    assert!(outcome(&section, "RPC-042")
        .message
        .ends_with("rejected: JSON-RPC error -32603: Internal error"));
}

fn streaming_profile() -> RpcProfile {
    RpcProfile {
        streaming: Some(true),
        extended_card: false,
    }
}

#[tokio::test]
async fn stream_and_resubscribe() {
    let transport = full_server()
        .rpc_stream(
            METHOD_MESSAGE_STREAM,
            vec![
                task_value("t-9", "working"),
                json!({"kind": "status-update", "taskId": "t-9", "final": true, "status": {"state": "completed"}}),
            ],
        )
        .rpc_stream(
            METHOD_TASKS_RESUBSCRIBE,
            vec![json!({"kind": "status-update", "taskId": "t-9", "final": true})],
        );
    let section = run(&transport, streaming_profile()).await;

    assert!(outcome(&section, "RPC-030").message.contains("2 SSE event"));
    assert!(outcome(&section, "RPC-031").message.contains("t-9"));
    assert!(outcome(&section, "RPC-032").passed);
    assert!(!section.has_failures());
}

#[tokio::test]
async fn stream_without_task_id_warns_and_skips_resubscribe() {
    let transport = full_server().rpc_stream(
        METHOD_MESSAGE_STREAM,
        vec![json!({"kind": "message", "messageId": "m", "role": "agent", "parts": []})],
    );
    let section = run(&transport, streaming_profile()).await;

    let o = outcome(&section, "RPC-031");
    assert!(!o.passed);
    assert_eq!(o.severity, Severity::Warn);
    assert!(section.find("RPC-032").next().is_none());
    assert!(!transport.called(&format!("SSE {METHOD_TASKS_RESUBSCRIBE}")));
    assert!(!section.has_failures());
    assert!(section.has_warnings());
}

#[tokio::test]
async fn empty_stream_fails() {
    let transport = full_server().on_stream(METHOD_MESSAGE_STREAM, Vec::new());
    let section = run(&transport, streaming_profile()).await;
    let o = outcome(&section, "RPC-030");
    assert!(!o.passed);
    assert!(section.find("RPC-031").next().is_none());
}

#[tokio::test]
async fn undeclared_streaming_is_still_probed() {
    let transport = full_server().on_stream(
        METHOD_MESSAGE_STREAM,
        vec![SseEvent::new(None, r#"{"kind":"status-update","taskId":"t-2"}"#)],
    );
    let profile = RpcProfile {
        streaming: None,
        extended_card: false,
    };
    let section = run(&transport, profile).await;
    assert!(transport.called(&format!("SSE {METHOD_MESSAGE_STREAM}")));
    assert!(outcome(&section, "RPC-031").passed);
}

fn extended_profile() -> RpcProfile {
    RpcProfile {
        streaming: Some(false),
        extended_card: true,
    }
}

#[tokio::test]
async fn extended_card_unauthorized_is_expected() {
    let transport = full_server().on_anonymous_post(
        METHOD_EXTENDED_CARD,
        HttpResponse::new(401, Some("application/json"), "{}"),
    );
    let section = run(&transport, extended_profile()).await;
    assert!(outcome(&section, "RPC-050").passed);
    assert!(transport.called(&format!("POST-ANON {METHOD_EXTENDED_CARD}")));
}

#[tokio::test]
async fn extended_card_must_be_a_valid_card() {
    let transport = full_server().on_anonymous_post(
        METHOD_EXTENDED_CARD,
        json_ok(rpc_result_envelope(json!({"name": "half a card"}))),
    );
    let section = run(&transport, extended_profile()).await;
    let o = outcome(&section, "RPC-050");
    assert!(!o.passed);
    assert!(o.message.contains("invalid AgentCard"));

    let transport = full_server().on_anonymous_post(
        METHOD_EXTENDED_CARD,
        json_ok(rpc_result_envelope(common::conforming_card("http://agent.test"))),
    );
    let section = run(&transport, extended_profile()).await;
    assert!(outcome(&section, "RPC-050").passed);
}

#[tokio::test]
async fn extended_card_not_configured_fails() {
    let transport = full_server().on_anonymous_post(
        METHOD_EXTENDED_CARD,
        json_ok(json!({"jsonrpc": "2.0", "id": "ac-1", "error": {"code": -32007, "message": "not configured"}})),
    );
    let section = run(&transport, extended_profile()).await;
    assert!(!outcome(&section, "RPC-050").passed);
}

#[tokio::test]
async fn stand_alone_stream_probe() {
    let settings = Settings::default();
    let transport = ScriptedTransport::new()
        .rpc_stream(METHOD_MESSAGE_STREAM, vec![task_value("t-3", "working")]);
    let checks = JsonRpcChecks::new(&transport, &settings, URL, RpcProfile::default());
    let o = checks.stream_probe("hello").await;
    assert_eq!(o.rule_code, "RPC-STREAM");
    assert!(o.passed);
    assert_eq!(o.detail.unwrap()["events"].as_array().unwrap().len(), 1);

    let refused = ScriptedTransport::new();
    let checks = JsonRpcChecks::new(&refused, &settings, URL, RpcProfile::default());
    assert!(!checks.stream_probe("hello").await.passed);
}

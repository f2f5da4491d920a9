//! Discovery documents served by the demo target, one per [`DemoMode`].

use serde_json::{json, Value};

use super::DemoMode;
use crate::utils::constants::{REST_VERSION_SEGMENT, TRANSPORT_HTTP_JSON, TRANSPORT_JSONRPC};

/// Path of the demo JSON-RPC endpoint.
pub const JSONRPC_PATH: &str = "/a2a/v1/jsonrpc";

pub fn jsonrpc_url(base_url: &str) -> String {
    format!("{}{JSONRPC_PATH}", base_url.trim_end_matches('/'))
}

pub fn rest_url(base_url: &str) -> String {
    format!("{}/{REST_VERSION_SEGMENT}", base_url.trim_end_matches('/'))
}

fn hello_skill() -> Value {
    json!({
        "id": "hello_world",
        "name": "Returns hello world",
        "description": "just returns hello world",
        "tags": ["hello world"],
        "examples": ["hi", "hello world"]
    })
}

fn conforming_card(base_url: &str) -> Value {
    let rpc = jsonrpc_url(base_url);
    json!({
        "protocolVersion": "0.3.0",
        "name": "Hello World Agent",
        "description": "Just a hello world agent",
        "url": rpc,
        "preferredTransport": TRANSPORT_JSONRPC,
        "additionalInterfaces": [
            {"url": rpc, "transport": TRANSPORT_JSONRPC},
            {"url": rest_url(base_url), "transport": TRANSPORT_HTTP_JSON}
        ],
        "version": "1.0.0",
        "provider": {"organization": "a2a-check", "url": "https://github.com/a2a-check"},
        "iconUrl": "https://a2a-check.example/icon.png",
        "capabilities": {
            "streaming": true,
            "pushNotifications": true,
            "stateTransitionHistory": false
        },
        "security": [{"bearer": []}],
        "securitySchemes": {
            "bearer": {"type": "http", "scheme": "bearer", "bearerFormat": "opaque"}
        },
        "defaultInputModes": ["text/plain"],
        "defaultOutputModes": ["text/plain", "application/json"],
        "skills": [hello_skill()],
        "supportsAuthenticatedExtendedCard": true
    })
}

/// The public discovery document for `mode`.
///
/// In [`DemoMode::Errors`] the document no longer satisfies the schema.
pub fn public_card(mode: DemoMode, base_url: &str) -> Value {
    let mut card = conforming_card(base_url);
    match mode {
        DemoMode::Ok => {}
        DemoMode::Warn => {
            card["protocolVersion"] = json!("0.2.5");
            card["version"] = json!("1.0");
            card["iconUrl"] = json!("ftp://a2a-check.example/icon.png");
            card["provider"] = json!({"organization": "a2a-check"});
            card["skills"][0]["tags"] = json!([]);
            if let Some(doc) = card.as_object_mut() {
                doc.remove("security");
                doc.remove("securitySchemes");
            }
        }
        DemoMode::Mixed => {
            card["description"] = json!("");
            card["capabilities"]["pushNotifications"] = json!(false);
            card["supportsAuthenticatedExtendedCard"] = json!(false);
            card["skills"] = json!([
                hello_skill(),
                {
                    "id": "hello_world",
                    "name": "Says hello again",
                    "description": "a second skill reusing the first id",
                    "tags": ["hello world"]
                }
            ]);
        }
        DemoMode::Errors => {
            if let Some(doc) = card.as_object_mut() {
                doc.remove("name");
                doc.remove("version");
                doc.remove("defaultInputModes");
            }
            card["capabilities"]["streaming"] = json!("yes");
            card["capabilities"]["pushNotifications"] = json!(1);
        }
    }
    card
}

/// The authenticated extended descriptor: the public one plus a second skill.
pub fn extended_card(mode: DemoMode, base_url: &str) -> Value {
    let mut card = public_card(mode, base_url);
    card["name"] = json!("Hello World Agent - Extended Edition");
    card["description"] = json!("The full-featured hello world agent for authenticated users.");
    card["version"] = json!("1.0.1");
    if let Some(skills) = card["skills"].as_array_mut() {
        skills.push(json!({
            "id": "super_hello_world",
            "name": "Returns a SUPER Hello World",
            "description": "A more enthusiastic greeting, only for authenticated users.",
            "tags": ["hello world", "super", "extended"],
            "examples": ["super hi", "give me a super hello"]
        }));
    }
    card
}

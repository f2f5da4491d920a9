//! Shared test utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use a2a_check::client::{HttpResponse, SseEvent, SseStream, Transport};
use a2a_check::error::{ProbeError, ProbeResult};
use a2a_check::server::{demo_router, DemoMode};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Start the demo target on a random port. Returns the base URL and a handle
/// to the serving task.
pub async fn start_demo(mode: DemoMode) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    let app = demo_router(mode, &base_url);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Brief wait for the server to start accepting connections.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (base_url, handle)
}

/// JSON `HttpResponse` with status 200.
pub fn json_ok(body: Value) -> HttpResponse {
    HttpResponse::new(200, Some("application/json"), body.to_string())
}

pub fn rpc_result_envelope(result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": "1", "result": result})
}

pub fn rpc_error_envelope(code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": "1", "error": {"code": code, "message": message}})
}

/// In-memory [`Transport`] replaying canned responses.
///
/// POSTs and streams are keyed by the JSON-RPC `method` of the body when it
/// has one, otherwise by URL. GETs are keyed by URL. Anything unscripted
/// fails as a refused connection. Every call is recorded as
/// `"<VERB> <key>"`.
#[derive(Default)]
pub struct ScriptedTransport {
    gets: HashMap<String, HttpResponse>,
    posts: HashMap<String, HttpResponse>,
    anonymous_posts: HashMap<String, HttpResponse>,
    streams: HashMap<String, Vec<SseEvent>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(mut self, url: &str, response: HttpResponse) -> Self {
        self.gets.insert(url.to_string(), response);
        self
    }

    pub fn on_post(mut self, key: &str, response: HttpResponse) -> Self {
        self.posts.insert(key.to_string(), response);
        self
    }

    pub fn on_anonymous_post(mut self, key: &str, response: HttpResponse) -> Self {
        self.anonymous_posts.insert(key.to_string(), response);
        self
    }

    pub fn rpc_result(self, method: &str, result: Value) -> Self {
        self.on_post(method, json_ok(rpc_result_envelope(result)))
    }

    pub fn rpc_error(self, method: &str, code: i64, message: &str) -> Self {
        self.on_post(method, json_ok(rpc_error_envelope(code, message)))
    }

    /// Stream whose frames are JSON-RPC success envelopes around `results`.
    pub fn rpc_stream(self, method: &str, results: Vec<Value>) -> Self {
        let events = results
            .into_iter()
            .map(|r| SseEvent::new(None, rpc_result_envelope(r).to_string()))
            .collect();
        self.on_stream(method, events)
    }

    pub fn on_stream(mut self, key: &str, events: Vec<SseEvent>) -> Self {
        self.streams.insert(key.to_string(), events);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether any recorded call starts with `prefix`.
    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }

    fn record(&self, verb: &str, key: &str) {
        self.calls.lock().unwrap().push(format!("{verb} {key}"));
    }

    fn key(url: &str, body: &Value) -> String {
        body.get("method")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| url.to_string())
    }

    fn refused(key: &str) -> ProbeError {
        ProbeError::Transport(format!("{key}: connection refused"))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> ProbeResult<HttpResponse> {
        self.record("GET", url);
        self.gets.get(url).cloned().ok_or_else(|| Self::refused(url))
    }

    async fn post_json(&self, url: &str, body: &Value) -> ProbeResult<HttpResponse> {
        let key = Self::key(url, body);
        self.record("POST", &key);
        self.posts.get(&key).cloned().ok_or_else(|| Self::refused(&key))
    }

    async fn post_json_anonymous(&self, url: &str, body: &Value) -> ProbeResult<HttpResponse> {
        let key = Self::key(url, body);
        self.record("POST-ANON", &key);
        self.anonymous_posts
            .get(&key)
            .or_else(|| self.posts.get(&key))
            .cloned()
            .ok_or_else(|| Self::refused(&key))
    }

    async fn open_sse(&self, url: &str, body: &Value) -> ProbeResult<SseStream> {
        let key = Self::key(url, body);
        self.record("SSE", &key);
        self.streams
            .get(&key)
            .cloned()
            .map(SseStream::from_events)
            .ok_or_else(|| Self::refused(&key))
    }
}

/// A conforming discovery document pointing at `base_url`.
pub fn conforming_card(base_url: &str) -> Value {
    json!({
        "protocolVersion": "0.3.0",
        "name": "Scripted Agent",
        "description": "An agent made of canned responses",
        "url": format!("{base_url}/rpc"),
        "preferredTransport": "JSONRPC",
        "additionalInterfaces": [
            {"url": format!("{base_url}/rpc"), "transport": "JSONRPC"},
            {"url": format!("{base_url}/v1"), "transport": "HTTP+JSON"}
        ],
        "version": "1.2.3",
        "capabilities": {"streaming": false, "pushNotifications": false},
        "defaultInputModes": ["text/plain"],
        "defaultOutputModes": ["text/plain"],
        "skills": [{
            "id": "echo",
            "name": "Echo",
            "description": "Echoes back messages",
            "tags": ["test"]
        }]
    })
}

pub fn task_value(id: &str, state: &str) -> Value {
    json!({
        "kind": "task",
        "id": id,
        "contextId": "ctx-1",
        "status": {"state": state}
    })
}

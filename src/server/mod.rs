//! Reference/demo target server.
//!
//! A small axum application that speaks the A2A JSON-RPC and HTTP+JSON
//! surfaces well enough to exercise every rule set end to end. Its behaviour
//! is selected by an explicit [`DemoMode`] passed at construction:
//!
//! | Mode | Behaviour |
//! |------|-----------|
//! | `ok` | conforming descriptor and behaviour; extended card needs a bearer token |
//! | `warn` | advisory deviations only |
//! | `mixed` | some ERROR-level deviations next to tolerated optional signals |
//! | `errors` | broken discovery document, plain-text JSON-RPC endpoint |
//!
//! # Routes
//!
//! - `GET /` — origin
//! - `GET /.well-known/agent-card.json` (and the legacy `agent.json`)
//! - `POST /a2a/v1/jsonrpc` — JSON-RPC 2.0, SSE for streaming methods
//! - `POST /v1/message:send`, `POST /v1/message:stream`
//! - `GET /v1/tasks/{id}`, `POST /v1/tasks/{id}:cancel`, `POST /v1/tasks/{id}:subscribe`
//! - `GET /v1/card`
//!
//! # Example
//!
//! ```rust,no_run
//! use a2a_check::server::{serve, DemoMode};
//!
//! # async fn run() -> std::io::Result<()> {
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:9999").await?;
//! serve(listener, DemoMode::Ok, None).await
//! # }
//! ```

pub mod cards;
mod jsonrpc;
mod rest;
pub mod store;

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::types::{Message, TaskState, TaskStatusUpdateEvent};
use crate::utils::constants::{AGENT_CARD_WELL_KNOWN_PATH, PREV_AGENT_CARD_WELL_KNOWN_PATH};
pub use store::DemoStore;

/// Behaviour profile of the demo target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum DemoMode {
    #[default]
    Ok,
    Warn,
    Mixed,
    Errors,
}

impl DemoMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DemoMode::Ok => "ok",
            DemoMode::Warn => "warn",
            DemoMode::Mixed => "mixed",
            DemoMode::Errors => "errors",
        }
    }
}

impl fmt::Display for DemoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared state for the routes.
pub struct AppState {
    mode: DemoMode,
    card: Value,
    extended_card: Value,
    store: DemoStore,
}

impl AppState {
    pub fn new(mode: DemoMode, base_url: &str) -> Self {
        Self {
            mode,
            card: cards::public_card(mode, base_url),
            extended_card: cards::extended_card(mode, base_url),
            store: DemoStore::new(),
        }
    }

    pub fn mode(&self) -> DemoMode {
        self.mode
    }

    pub fn store(&self) -> &DemoStore {
        &self.store
    }

    /// Whether every protocol endpoint should answer with plain text.
    fn answers_plain_text(&self) -> bool {
        self.mode == DemoMode::Errors
    }

    fn advertises_extended_card(&self) -> bool {
        self.card.get("supportsAuthenticatedExtendedCard") == Some(&Value::Bool(true))
    }

    /// Extended card access decision for a request carrying `headers`.
    fn extended_card_access(&self, headers: &HeaderMap) -> ExtendedCardAccess {
        if !self.advertises_extended_card() {
            ExtendedCardAccess::NotConfigured
        } else if self.mode == DemoMode::Ok && !has_bearer(headers) {
            ExtendedCardAccess::Unauthorized
        } else {
            ExtendedCardAccess::Granted
        }
    }

    /// Run one streamed exchange for `message`, returning the event payloads.
    ///
    /// In `warn` mode the events are bare agent messages carrying no task id;
    /// otherwise a task is created, reported, and completed.
    async fn stream_exchange(&self, message: Message) -> Vec<Value> {
        if self.mode == DemoMode::Warn {
            return ["Hello", "World"]
                .into_iter()
                .map(|text| Message::agent(uuid::Uuid::new_v4().to_string(), text))
                .filter_map(|m| serde_json::to_value(m).ok())
                .collect();
        }

        let task = self.store.create(TaskState::Working, message).await;
        let mut events: Vec<Value> = Vec::new();
        events.extend(serde_json::to_value(&task).ok());
        events.extend(serde_json::to_value(TaskStatusUpdateEvent::for_task(&task, false)).ok());
        if let Some(done) = self.store.transition(&task.id, TaskState::Completed).await {
            events.extend(serde_json::to_value(TaskStatusUpdateEvent::for_task(&done, true)).ok());
        }
        events
    }

    /// Final status event for an existing task, for resubscription.
    async fn resubscribe_events(&self, task_id: &str) -> Option<Vec<Value>> {
        let task = self.store.get(task_id, Some(0)).await?;
        Some(
            serde_json::to_value(TaskStatusUpdateEvent::for_task(&task, true))
                .ok()
                .into_iter()
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtendedCardAccess {
    Granted,
    Unauthorized,
    NotConfigured,
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| !token.trim().is_empty())
        .unwrap_or(false)
}

fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

/// SSE response carrying one event per payload, then closing.
fn sse_response(events: Vec<String>) -> Response {
    let stream = async_stream::stream! {
        for data in events {
            yield Ok::<Event, Infallible>(Event::default().data(data));
        }
    };
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Build the demo router. `base_url` is where clients reach this server and
/// is embedded in the discovery document.
pub fn demo_router(mode: DemoMode, base_url: &str) -> Router {
    let state = Arc::new(AppState::new(mode, base_url));

    Router::new()
        .route("/", get(handle_origin))
        .route(AGENT_CARD_WELL_KNOWN_PATH, get(handle_agent_card))
        .route(PREV_AGENT_CARD_WELL_KNOWN_PATH, get(handle_agent_card_deprecated))
        .route(cards::JSONRPC_PATH, post(jsonrpc::handle_jsonrpc))
        .route("/v1/message:send", post(rest::handle_message_send))
        .route("/v1/message:stream", post(rest::handle_message_stream))
        .route(
            "/v1/tasks/{id}",
            get(rest::handle_get_task).post(rest::handle_task_action),
        )
        .route("/v1/card", get(rest::handle_extended_card))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the demo target on `listener` until the process stops.
///
/// `public_url` overrides the base URL advertised in the descriptor, which
/// otherwise comes from the listener's local address.
pub async fn serve(
    listener: TcpListener,
    mode: DemoMode,
    public_url: Option<String>,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    let base_url = public_url.unwrap_or_else(|| format!("http://{addr}"));
    info!(%addr, %mode, %base_url, "demo target listening");
    axum::serve(listener, demo_router(mode, &base_url)).await
}

async fn handle_origin(State(state): State<Arc<AppState>>) -> Response {
    plain_text(
        StatusCode::OK,
        format!("a2a-check demo agent (mode {})", state.mode),
    )
}

async fn handle_agent_card(State(state): State<Arc<AppState>>) -> Response {
    if state.answers_plain_text() {
        return plain_text(StatusCode::OK, state.card.to_string());
    }
    Json(&state.card).into_response()
}

async fn handle_agent_card_deprecated(state: State<Arc<AppState>>) -> Response {
    warn!(
        "deprecated agent card endpoint '{PREV_AGENT_CARD_WELL_KNOWN_PATH}' accessed; \
         use '{AGENT_CARD_WELL_KNOWN_PATH}' instead"
    );
    handle_agent_card(state).await
}

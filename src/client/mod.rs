//! Probe-side networking: everything the rule sets need to talk to a target.
//!
//! - [`Transport`] / [`HttpTransport`] — GET, POST-JSON and OPEN-SSE with
//!   observations (status, headers, body) instead of errors for non-2xx
//! - [`SseStream`] — raw SSE frames with deadline-bounded collection
//! - [`card_resolver`] — discovery-document URL resolution
//! - [`JsonRpcClient`] — JSON-RPC 2.0 calls against one endpoint
//!
//! # Quick Start
//!
//! ```no_run
//! use a2a_check::client::{build_request, HttpTransport, JsonRpcClient};
//! use a2a_check::types::JsonRpcReply;
//! use a2a_check::Settings;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(&Settings::default())?;
//! let rpc = JsonRpcClient::new(&transport, "http://localhost:8080/a2a/v1/jsonrpc");
//! let payload = build_request("tasks/get", &json!({"id": "t-1"}))?;
//! let (reply, response) = rpc.call_and_parse(&payload).await?;
//! println!("HTTP {} {}", response.status, response.content_type());
//! if let JsonRpcReply::Error(err) = reply {
//!     println!("rejected with {}", err.code);
//! }
//! # Ok(())
//! # }
//! ```

pub mod card_resolver;
mod jsonrpc;
mod sse;
mod transport;

pub use card_resolver::{build_origin, ensure_scheme, resolve_card_url, ResolvedTarget};
pub use jsonrpc::{build_request, parse_reply, stream_result, JsonRpcClient};
pub use sse::{SseCollection, SseEvent, SseStream};
pub use transport::{HttpResponse, HttpTransport, Transport};

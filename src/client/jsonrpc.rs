//! JSON-RPC 2.0 call helper bound to one endpoint URL.
//!
//! Builds request envelopes, posts them through a [`Transport`] and parses
//! the reply, while keeping the raw HTTP observation for the rule sets.

use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{ProbeError, ProbeResult};
use crate::types::{JsonRpcReply, JsonRpcRequest, SendMessageParams};
use crate::utils::constants::METHOD_MESSAGE_STREAM;

use super::sse::{SseCollection, SseEvent, SseStream};
use super::transport::{HttpResponse, Transport};

/// Build a request envelope with a fresh random id.
pub fn build_request<P: Serialize>(method: &str, params: &P) -> ProbeResult<Value> {
    let id = uuid::Uuid::new_v4().to_string();
    Ok(JsonRpcRequest::with_params(id, method, params)?.to_value())
}

/// Payload carried by one streamed frame.
///
/// Frames are usually JSON-RPC envelopes whose `result` is the event; some
/// servers send the bare event instead. Non-JSON frames and error envelopes
/// yield `None`.
pub fn stream_result(event: &SseEvent) -> Option<Value> {
    let value = event.json()?;
    if value.get("jsonrpc").is_some() {
        value.get("result").cloned()
    } else {
        Some(value)
    }
}

/// JSON-RPC client for a single endpoint.
pub struct JsonRpcClient<'a> {
    transport: &'a dyn Transport,
    url: String,
}

impl std::fmt::Debug for JsonRpcClient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl<'a> JsonRpcClient<'a> {
    pub fn new(transport: &'a dyn Transport, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    /// Endpoint URL this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `payload` and return the raw HTTP observation.
    pub async fn call_raw(&self, payload: &Value) -> ProbeResult<HttpResponse> {
        debug!(url = %self.url, method = ?payload.get("method"), "JSON-RPC call");
        self.transport.post_json(&self.url, payload).await
    }

    /// POST `payload` without credentials.
    pub async fn call_raw_anonymous(&self, payload: &Value) -> ProbeResult<HttpResponse> {
        debug!(url = %self.url, method = ?payload.get("method"), "JSON-RPC call (anonymous)");
        self.transport.post_json_anonymous(&self.url, payload).await
    }

    /// POST `payload` and parse the body as a JSON-RPC reply.
    ///
    /// Fails with [`ProbeError::InvalidJson`] when the body is not JSON and
    /// [`ProbeError::InvalidResponse`] when it is not a JSON-RPC envelope.
    pub async fn call_and_parse(&self, payload: &Value) -> ProbeResult<(JsonRpcReply, HttpResponse)> {
        let response = self.call_raw(payload).await?;
        let reply = parse_reply(&response)?;
        Ok((reply, response))
    }

    /// Open an SSE stream for `method`.
    pub async fn open_stream<P: Serialize>(&self, method: &str, params: &P) -> ProbeResult<SseStream> {
        let payload = build_request(method, params)?;
        debug!(url = %self.url, %method, "JSON-RPC stream");
        self.transport.open_sse(&self.url, &payload).await
    }

    /// Open an SSE stream for `method` and collect frames until `deadline`.
    pub async fn collect_stream<P: Serialize>(
        &self,
        method: &str,
        params: &P,
        deadline: Instant,
    ) -> ProbeResult<SseCollection> {
        let stream = self.open_stream(method, params).await?;
        Ok(stream.collect_until(deadline).await)
    }

    /// `message/stream` a single text part and collect frames until `deadline`.
    pub async fn stream_text(&self, text: &str, deadline: Instant) -> ProbeResult<SseCollection> {
        let params = SendMessageParams::text(uuid::Uuid::new_v4().to_string(), text);
        self.collect_stream(METHOD_MESSAGE_STREAM, &params, deadline)
            .await
    }
}

/// Parse an HTTP observation as a JSON-RPC reply.
pub fn parse_reply(response: &HttpResponse) -> ProbeResult<JsonRpcReply> {
    let body: Value = serde_json::from_str(&response.body).map_err(|e| {
        ProbeError::InvalidJson(format!(
            "response is not JSON (HTTP {}): {e}",
            response.status
        ))
    })?;
    JsonRpcReply::from_value(&body)
}

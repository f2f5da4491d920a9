//! Server-Sent Events (SSE) stream handling for streaming probes.
//!
//! The rule sets only need raw `{event, data}` frames: they decide for
//! themselves whether a frame carries a JSON-RPC envelope or a bare event.
//! Frames are parsed by a background task and delivered through a channel;
//! dropping the [`SseStream`] aborts that task, which releases the underlying
//! HTTP connection on every exit path.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{ProbeError, ProbeResult};

/// One dispatched SSE frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseEvent {
    /// Value of the `event:` field, if the frame named one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

impl SseEvent {
    pub fn new(event: Option<&str>, data: impl Into<String>) -> Self {
        SseEvent {
            event: event.map(String::from),
            data: data.into(),
        }
    }

    /// Frame data parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.data).ok()
    }
}

/// Incremental line-oriented SSE frame assembler.
#[derive(Debug, Default)]
pub(crate) struct FrameParser {
    event: Option<String>,
    data: Vec<String>,
}

impl FrameParser {
    /// Feed one line (without its terminator). Returns a frame when a blank
    /// line completes one.
    pub(crate) fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment / keep-alive.
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // id:, retry: and unknown fields carry nothing the probes use.
            _ => {}
        }
        None
    }

    /// Flush a trailing frame that was not followed by a blank line.
    pub(crate) fn finish(&mut self) -> Option<SseEvent> {
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        // "[DONE]" is a common end-of-stream sentinel, not an event.
        if data.trim() == "[DONE]" {
            return None;
        }
        Some(SseEvent { event, data })
    }
}

/// What a deadline-bounded read of an SSE stream produced.
#[derive(Debug, Default)]
pub struct SseCollection {
    /// Frames received before the stream ended or the deadline elapsed.
    pub events: Vec<SseEvent>,
    /// Read error that ended the stream early, if any.
    pub error: Option<ProbeError>,
    /// The deadline elapsed before the server closed the stream.
    pub timed_out: bool,
}

/// A stream of raw SSE frames from one HTTP response.
pub struct SseStream {
    receiver: mpsc::Receiver<ProbeResult<SseEvent>>,
    /// Background parse task. Aborted on drop.
    task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for SseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SseStream").finish_non_exhaustive()
    }
}

impl SseStream {
    /// Spawn a task that reads `response` as SSE and forwards frames.
    pub(crate) fn from_response(response: reqwest::Response) -> Self {
        let (tx, rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            if let Err(e) = pump_frames(response, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        Self {
            receiver: rx,
            task: Some(task),
        }
    }

    /// A finished stream that yields `events` and then ends.
    ///
    /// Used by in-memory transports.
    pub fn from_events(events: Vec<SseEvent>) -> Self {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity covers every event, so this never fails.
            let _ = tx.try_send(Ok(event));
        }
        Self {
            receiver: rx,
            task: None,
        }
    }

    /// Next frame, or `None` once the server closed the stream.
    pub async fn next(&mut self) -> Option<ProbeResult<SseEvent>> {
        self.receiver.recv().await
    }

    /// Read frames until the stream ends, an error occurs, or `deadline`
    /// passes, whichever comes first. The stream is released on return.
    pub async fn collect_until(mut self, deadline: Instant) -> SseCollection {
        let mut out = SseCollection::default();
        loop {
            match tokio::time::timeout_at(deadline, self.next()).await {
                Err(_) => {
                    out.timed_out = true;
                    break;
                }
                Ok(None) => break,
                Ok(Some(Ok(event))) => out.events.push(event),
                Ok(Some(Err(e))) => {
                    out.error = Some(e);
                    break;
                }
            }
        }
        out
    }
}

impl Drop for SseStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Read the response body line by line and forward complete frames to `tx`.
async fn pump_frames(
    response: reqwest::Response,
    tx: &mpsc::Sender<ProbeResult<SseEvent>>,
) -> ProbeResult<()> {
    use futures::StreamExt;

    let mut body = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();
    let mut parser = FrameParser::default();

    while let Some(chunk) = body.next().await {
        let chunk =
            chunk.map_err(|e| ProbeError::Transport(format!("error reading SSE stream: {e}")))?;
        buffer.extend_from_slice(&chunk);

        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = buffer.drain(..=pos).collect();
            let line = std::str::from_utf8(&raw[..raw.len() - 1])
                .map_err(|e| ProbeError::Transport(format!("invalid UTF-8 in SSE stream: {e}")))?
                .trim_end_matches('\r');

            if let Some(event) = parser.feed_line(line) {
                if tx.send(Ok(event)).await.is_err() {
                    // Receiver dropped.
                    return Ok(());
                }
            }
        }
    }

    if !buffer.is_empty() {
        let tail = String::from_utf8_lossy(&buffer).into_owned();
        if let Some(event) = parser.feed_line(tail.trim_end_matches('\r')) {
            let _ = tx.send(Ok(event)).await;
        }
    }
    if let Some(event) = parser.finish() {
        let _ = tx.send(Ok(event)).await;
    }

    Ok(())
}

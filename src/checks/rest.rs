//! HTTP+JSON compliance rule set (`REST-0xx`).
//!
//! Mirrors the JSON-RPC scenario over the REST mapping: `message:send`,
//! `message:stream`, then (given a task id) `tasks/{id}`, `tasks/{id}:cancel`
//! and `tasks/{id}:subscribe`, then the authenticated card endpoint.
//!
//! The base URL may be the service root (`http://host:8080`) or the versioned
//! base (`http://host:8080/v1`); endpoints resolve to the same paths either way.

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::client::{HttpResponse, SseCollection, Transport};
use crate::config::Settings;
use crate::error::ProbeResult;
use crate::model::{CheckOutcome, Section};
use crate::types::SendMessageParams;
use crate::utils::constants::REST_VERSION_SEGMENT;
use crate::utils::json::task_id_of;

/// Title of the section this rule set produces.
pub const SECTION_TITLE: &str = "HTTP+JSON";

/// Resolve `suffix` (e.g. `message:send`) against a REST base.
pub fn rest_endpoint(base: &str, suffix: &str) -> String {
    let base = base.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    let versioned = format!("/{REST_VERSION_SEGMENT}");
    if base.ends_with(&versioned) {
        format!("{base}/{suffix}")
    } else {
        format!("{base}{versioned}/{suffix}")
    }
}

fn accepted(status: u16) -> bool {
    matches!(status, 200 | 202)
}

fn content_type_outcome(code: &str, resp: &HttpResponse) -> CheckOutcome {
    if resp.is_json() {
        CheckOutcome::pass(code, format!("Content-Type {}", resp.content_type()))
    } else {
        let ct = resp.content_type();
        CheckOutcome::error(
            code,
            format!("Content-Type not JSON ({})", if ct.is_empty() { "missing" } else { ct }),
        )
    }
}

fn status_outcome(code: &str, what: &str, resp: &HttpResponse) -> CheckOutcome {
    CheckOutcome::check(
        code,
        accepted(resp.status),
        format!("{what} HTTP {}", resp.status),
    )
    .with_detail(json!({ "status": resp.status }))
}

/// Runs the HTTP+JSON scenario against one base URL.
pub struct RestChecks<'a> {
    transport: &'a dyn Transport,
    settings: &'a Settings,
    base: String,
}

impl<'a> RestChecks<'a> {
    pub fn new(transport: &'a dyn Transport, settings: &'a Settings, base: &str) -> Self {
        Self {
            transport,
            settings,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, suffix: &str) -> String {
        rest_endpoint(&self.base, suffix)
    }

    /// Run the whole scenario and collect one `HTTP+JSON` section.
    pub async fn run_section(&self) -> Section {
        info!(base = %self.base, "HTTP+JSON checks");
        let mut s = Section::new(SECTION_TITLE);

        let task_id = self.message_send(&mut s).await;
        s.push(self.message_stream().await);

        match task_id {
            Some(task_id) => self.task_lifecycle(&task_id, &mut s).await,
            None => s.push(CheckOutcome::pass(
                "REST-030",
                "tasks GET/cancel/subscribe skipped (no task id from send)",
            )),
        }

        s.extend(self.authenticated_card().await);
        s
    }

    async fn collect_sse(&self, url: &str, body: &Value) -> ProbeResult<SseCollection> {
        let deadline = Instant::now() + self.settings.stream_timeout;
        let stream = self.transport.open_sse(url, body).await?;
        Ok(stream.collect_until(deadline).await)
    }

    fn sse_outcome(code: &str, what: &str, result: ProbeResult<SseCollection>) -> CheckOutcome {
        match result {
            Ok(c) if !c.events.is_empty() => {
                CheckOutcome::pass(code, format!("{what} yielded {} event(s)", c.events.len()))
            }
            Ok(c) => CheckOutcome::error(
                code,
                match c.error {
                    Some(e) => format!("{what} yielded no events ({e})"),
                    None => format!("{what} yielded no events"),
                },
            ),
            Err(e) => CheckOutcome::error(code, format!("{what} failed: {e}")),
        }
    }

    // ---------------------------------------------------------------------
    // message:send / message:stream
    // ---------------------------------------------------------------------

    async fn message_send(&self, s: &mut Section) -> Option<String> {
        let url = self.endpoint("message:send");
        let payload = match serde_json::to_value(
            SendMessageParams::text("rest-msg-1", "ping").with_blocking(false),
        ) {
            Ok(p) => p,
            Err(e) => {
                s.push(CheckOutcome::error("REST-010", format!("message:send failed: {e}")));
                return None;
            }
        };

        let resp = match self.transport.post_json(&url, &payload).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%url, error = %e, "message:send transport failure");
                s.push(CheckOutcome::error("REST-010", format!("message:send failed: {e}")));
                return None;
            }
        };

        s.push(status_outcome("REST-010", "POST message:send", &resp));
        s.push(content_type_outcome("REST-011", &resp));

        if !resp.is_json() {
            return None;
        }
        resp.json().ok().and_then(|body| task_id_of(&body))
    }

    async fn message_stream(&self) -> CheckOutcome {
        let url = self.endpoint("message:stream");
        let payload = match serde_json::to_value(SendMessageParams::text("rest-stream-1", "stream test")) {
            Ok(p) => p,
            Err(e) => return CheckOutcome::error("REST-020", format!("message:stream failed: {e}")),
        };
        Self::sse_outcome("REST-020", "message:stream", self.collect_sse(&url, &payload).await)
    }

    // ---------------------------------------------------------------------
    // tasks/{id}
    // ---------------------------------------------------------------------

    async fn task_lifecycle(&self, task_id: &str, s: &mut Section) {
        let url = self.endpoint(&format!("tasks/{task_id}"));
        match self.transport.get(&url).await {
            Ok(resp) => {
                s.push(status_outcome("REST-030", &format!("GET tasks/{task_id}"), &resp));
                s.push(content_type_outcome("REST-031", &resp));
            }
            Err(e) => s.push(CheckOutcome::error(
                "REST-030",
                format!("GET tasks/{task_id} failed: {e}"),
            )),
        }

        let url = self.endpoint(&format!("tasks/{task_id}:cancel"));
        match self.transport.post_json(&url, &json!({})).await {
            Ok(resp) => {
                s.push(status_outcome(
                    "REST-032",
                    &format!("POST tasks/{task_id}:cancel"),
                    &resp,
                ));
                s.push(content_type_outcome("REST-034", &resp));
            }
            Err(e) => s.push(CheckOutcome::error(
                "REST-032",
                format!("POST tasks/{task_id}:cancel failed: {e}"),
            )),
        }

        let url = self.endpoint(&format!("tasks/{task_id}:subscribe"));
        s.push(Self::sse_outcome(
            "REST-033",
            "tasks:subscribe",
            self.collect_sse(&url, &json!({})).await,
        ));
    }

    // ---------------------------------------------------------------------
    // Authenticated card
    // ---------------------------------------------------------------------

    async fn authenticated_card(&self) -> Vec<CheckOutcome> {
        let url = self.endpoint("card");
        let path = format!("/{REST_VERSION_SEGMENT}/card");
        match self.transport.get(&url).await {
            Err(e) => vec![CheckOutcome::error(
                "REST-050",
                format!("GET {path} failed: {e}"),
            )],
            Ok(resp) if matches!(resp.status, 401 | 403) => vec![CheckOutcome::pass(
                "REST-050",
                format!("GET {path} HTTP {} (expected without auth)", resp.status),
            )],
            Ok(resp) if resp.status == 200 => vec![
                CheckOutcome::pass("REST-050", format!("GET {path} OK")),
                content_type_outcome("REST-051", &resp),
            ],
            Ok(resp) => vec![CheckOutcome::error(
                "REST-050",
                format!("GET {path} HTTP {}", resp.status),
            )
            .with_detail(json!({ "status": resp.status }))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_service_root() {
        assert_eq!(
            rest_endpoint("http://h:8080", "message:send"),
            "http://h:8080/v1/message:send"
        );
        assert_eq!(
            rest_endpoint("http://h:8080/", "/tasks/t1"),
            "http://h:8080/v1/tasks/t1"
        );
    }

    #[test]
    fn test_endpoint_from_versioned_base() {
        assert_eq!(
            rest_endpoint("http://h:8080/v1", "message:send"),
            "http://h:8080/v1/message:send"
        );
        assert_eq!(
            rest_endpoint("http://h:8080/v1/", "tasks/t1:cancel"),
            "http://h:8080/v1/tasks/t1:cancel"
        );
    }

    #[test]
    fn test_endpoint_does_not_treat_v10_as_versioned() {
        assert_eq!(
            rest_endpoint("http://h/api/v10", "card"),
            "http://h/api/v10/v1/card"
        );
    }

    #[test]
    fn test_status_acceptance() {
        assert!(accepted(200));
        assert!(accepted(202));
        assert!(!accepted(201));
        assert!(!accepted(404));
    }
}

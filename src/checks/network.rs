//! Discovery-document fetch and schema parse.
//!
//! Two probes, both always attempted: origin reachability (`NET-001`) and the
//! discovery endpoint itself (`URL-001`, `HTTP-200`, `HTTP-CT`, `JSON-001`).
//! The raw document is returned even when later parsing fails so that the
//! descriptor rules can still run on it.

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::client::card_resolver::{self, ResolvedTarget};
use crate::client::Transport;
use crate::config::Settings;
use crate::model::CheckOutcome;
use crate::types::AgentCard;

/// Everything the fetch step observed.
#[derive(Debug, Clone)]
pub struct CardFetch {
    pub target: ResolvedTarget,
    /// Parsed body, or an empty object when nothing usable came back.
    pub raw: Value,
    pub outcomes: Vec<CheckOutcome>,
}

/// Fetches and parses discovery documents.
pub struct CardService<'a> {
    transport: &'a dyn Transport,
    settings: &'a Settings,
}

impl<'a> CardService<'a> {
    pub fn new(transport: &'a dyn Transport, settings: &'a Settings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Probe the origin and the discovery endpoint of `target`.
    pub async fn fetch_raw(&self, target: &str, override_card_url: Option<&str>) -> CardFetch {
        let resolved =
            card_resolver::resolve(target, override_card_url, &self.settings.well_known_path);
        debug!(origin = %resolved.origin, card_url = %resolved.card_url, "resolved target");

        let mut outcomes = Vec::new();

        // Any HTTP response counts as reachable.
        match self.transport.get(&resolved.origin).await {
            Ok(resp) => outcomes.push(CheckOutcome::pass(
                "NET-001",
                format!("Origin reachable HTTP {}", resp.status),
            )),
            Err(e) => {
                warn!(origin = %resolved.origin, error = %e, "origin unreachable");
                outcomes.push(CheckOutcome::error(
                    "NET-001",
                    format!("Origin not reachable: {e}"),
                ));
            }
        }

        let mut raw = Value::Object(Map::new());

        match self.transport.get(&resolved.card_url).await {
            Ok(resp) => {
                outcomes.push(CheckOutcome::pass(
                    "URL-001",
                    format!("Card endpoint reachable HTTP {}", resp.status),
                ));

                outcomes.push(if resp.status == 200 {
                    CheckOutcome::pass("HTTP-200", "HTTP 200 OK")
                } else {
                    CheckOutcome::error(
                        "HTTP-200",
                        format!("Unexpected HTTP status {}", resp.status),
                    )
                    .with_detail(json!({ "status": resp.status }))
                });

                let ctype = resp.content_type().to_ascii_lowercase();
                outcomes.push(if resp.is_json() {
                    CheckOutcome::pass("HTTP-CT", format!("Content-Type {ctype}"))
                } else {
                    let shown = if ctype.is_empty() { "missing" } else { ctype.as_str() };
                    CheckOutcome::error("HTTP-CT", format!("Content-Type not JSON ({shown})"))
                });

                match resp.json() {
                    Ok(value) => {
                        raw = value;
                        outcomes.push(CheckOutcome::pass("JSON-001", "JSON parsed"));
                    }
                    Err(e) => outcomes.push(CheckOutcome::error(
                        "JSON-001",
                        format!("JSON parse error: {e}"),
                    )),
                }
            }
            Err(e) => {
                warn!(card_url = %resolved.card_url, error = %e, "card endpoint unreachable");
                outcomes.push(CheckOutcome::error(
                    "URL-001",
                    format!("Card endpoint not reachable: {e}"),
                ));
            }
        }

        CardFetch {
            target: resolved,
            raw,
            outcomes,
        }
    }

    /// Schema-validate `raw` into a typed descriptor (`CARD-STRUCT`).
    pub fn parse(raw: &Value) -> (Option<AgentCard>, CheckOutcome) {
        match AgentCard::validate(raw) {
            Ok(card) => (
                Some(card),
                CheckOutcome::pass("CARD-STRUCT", "AgentCard parsed via schema"),
            ),
            Err(errors) => {
                let listed: Vec<String> = errors.iter().map(ToString::to_string).collect();
                let outcome = CheckOutcome::error(
                    "CARD-STRUCT",
                    format!("Schema validation failed: [{}]", listed.join("; ")),
                )
                .with_detail(json!({ "errors": errors }));
                (None, outcome)
            }
        }
    }
}

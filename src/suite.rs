//! Suite orchestration.
//!
//! [`Suite`] wires the rule sets together for each probe command. Every probe
//! returns a fresh [`RunReport`]; the suite itself holds no state between
//! runs beyond the borrowed transport and settings.

use tracing::info;

use crate::checks::{card, jsonrpc, rest, CardChecks, CardFetch, CardService, JsonRpcChecks, RestChecks, RpcProfile};
use crate::client::Transport;
use crate::config::Settings;
use crate::model::{CheckOutcome, RunReport, Section, Severity};
use crate::types::AgentCard;
use crate::utils::constants::{TRANSPORT_HTTP_JSON, TRANSPORT_JSONRPC};

pub const NETWORK_SECTION: &str = "Network";
pub const SCHEMA_SECTION: &str = "Schema";
pub const STREAM_SECTION: &str = "JSON-RPC Stream";

/// Default text for the stand-alone stream probe.
pub const DEFAULT_STREAM_TEXT: &str = "stream test";

/// URL of the interface speaking `transport`, if the descriptor declares one.
pub fn pick_interface_url(card: &AgentCard, transport: &str) -> Option<String> {
    card.interface_url(transport).map(str::to_string)
}

/// Runs rule sets against one target.
pub struct Suite<'a> {
    transport: &'a dyn Transport,
    settings: &'a Settings,
}

impl<'a> Suite<'a> {
    pub fn new(transport: &'a dyn Transport, settings: &'a Settings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    async fn fetch(&self, target: &str, card_url: Option<&str>) -> CardFetch {
        CardService::new(self.transport, self.settings)
            .fetch_raw(target, card_url)
            .await
    }

    /// Network section only.
    pub async fn net_probe(&self, target: &str) -> RunReport {
        let fetch = self.fetch(target, None).await;
        RunReport::new(vec![Section::with_outcomes(NETWORK_SECTION, fetch.outcomes)])
    }

    /// Network, Schema and AgentCard sections.
    pub async fn card(&self, target: &str, card_url: Option<&str>) -> RunReport {
        let (report, _) = self.card_stage(target, card_url).await;
        report
    }

    /// The descriptor stage shared by `card` and `run_all`.
    async fn card_stage(&self, target: &str, card_url: Option<&str>) -> (RunReport, Option<AgentCard>) {
        let fetch = self.fetch(target, card_url).await;
        let (parsed, schema) = CardService::parse(&fetch.raw);

        let mut report = RunReport::default();
        report.push(Section::with_outcomes(NETWORK_SECTION, fetch.outcomes));
        report.push(Section::with_outcomes(SCHEMA_SECTION, vec![schema]));
        report.push(CardChecks::new(&fetch.target.card_url, &fetch.raw, parsed.as_ref()).run_section());
        (report, parsed)
    }

    /// Network and Schema only; the typed descriptor when it parsed.
    async fn descriptor(&self, target: &str, card_url: Option<&str>) -> (RunReport, Option<AgentCard>) {
        let fetch = self.fetch(target, card_url).await;
        let (parsed, schema) = CardService::parse(&fetch.raw);
        let report = RunReport::new(vec![
            Section::with_outcomes(NETWORK_SECTION, fetch.outcomes),
            Section::with_outcomes(SCHEMA_SECTION, vec![schema]),
        ]);
        (report, parsed)
    }

    /// JSON-RPC rule set against a bare endpoint: no streaming, no extended card.
    pub async fn rpc_ping(&self, jsonrpc_url: &str) -> RunReport {
        let checks = JsonRpcChecks::new(self.transport, self.settings, jsonrpc_url, RpcProfile::ping());
        RunReport::new(vec![checks.run_section().await])
    }

    /// Resolve the JSON-RPC endpoint from the descriptor, then ping it.
    pub async fn rpc_ping_from_card(&self, target: &str, card_url: Option<&str>) -> RunReport {
        let (mut report, parsed) = self.descriptor(target, card_url).await;
        let Some(card) = parsed else {
            return report;
        };
        match pick_interface_url(&card, TRANSPORT_JSONRPC) {
            Some(url) => {
                let checks = JsonRpcChecks::new(self.transport, self.settings, url, RpcProfile::ping());
                report.push(checks.run_section().await);
            }
            None => report.push(Section::with_outcomes(
                jsonrpc::SECTION_TITLE,
                vec![CheckOutcome::error(
                    "RPC-000",
                    "Agent does not declare a JSON-RPC interface",
                )],
            )),
        }
        report
    }

    /// Single `RPC-STREAM` check.
    pub async fn rpc_stream(&self, jsonrpc_url: &str, text: &str) -> RunReport {
        let checks = JsonRpcChecks::new(self.transport, self.settings, jsonrpc_url, RpcProfile::default());
        RunReport::new(vec![Section::with_outcomes(
            STREAM_SECTION,
            vec![checks.stream_probe(text).await],
        )])
    }

    /// HTTP+JSON rule set against a REST base URL.
    pub async fn rest_check(&self, base: &str) -> RunReport {
        RunReport::new(vec![RestChecks::new(self.transport, self.settings, base).run_section().await])
    }

    /// Resolve the HTTP+JSON base from the descriptor, then check it.
    pub async fn rest_check_from_card(&self, target: &str, card_url: Option<&str>) -> RunReport {
        let (mut report, parsed) = self.descriptor(target, card_url).await;
        let Some(card) = parsed else {
            return report;
        };
        match pick_interface_url(&card, TRANSPORT_HTTP_JSON) {
            Some(base) => report.push(RestChecks::new(self.transport, self.settings, &base).run_section().await),
            None => report.push(Section::with_outcomes(
                rest::SECTION_TITLE,
                vec![CheckOutcome::error(
                    "REST-000",
                    "Agent does not declare an HTTP+JSON interface",
                )],
            )),
        }
        report
    }

    /// Full orchestrated run.
    ///
    /// Network, Schema and AgentCard always run. When the descriptor parsed,
    /// the JSON-RPC rule set runs against its JSON-RPC interface (a WARN
    /// placeholder when none is declared) and the HTTP+JSON rule set against
    /// its HTTP+JSON interface (an INFO placeholder when none is declared).
    pub async fn run_all(&self, target: &str, card_url: Option<&str>) -> RunReport {
        info!(%target, bearer = %self.settings.masked_bearer(), "running full suite");
        let (mut report, parsed) = self.card_stage(target, card_url).await;
        let Some(card) = parsed else {
            info!("descriptor did not parse; stopping after {}", card::SECTION_TITLE);
            return report;
        };

        match pick_interface_url(&card, TRANSPORT_JSONRPC) {
            Some(url) => {
                let checks = JsonRpcChecks::new(self.transport, self.settings, url, RpcProfile::from_card(&card));
                report.push(checks.run_section().await);
            }
            None => report.push(Section::with_outcomes(
                jsonrpc::SECTION_TITLE,
                vec![CheckOutcome::warn(
                    "RPC-000",
                    "Agent does not declare a JSON-RPC interface",
                )],
            )),
        }

        match pick_interface_url(&card, TRANSPORT_HTTP_JSON) {
            Some(base) => report.push(RestChecks::new(self.transport, self.settings, &base).run_section().await),
            None => report.push(Section::with_outcomes(
                rest::SECTION_TITLE,
                vec![CheckOutcome::new(
                    "REST-000",
                    true,
                    "No HTTP+JSON interface declared (optional)",
                    Severity::Info,
                )],
            )),
        }

        info!(tally = %report.tally(), "suite finished");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(extra: serde_json::Value) -> AgentCard {
        let mut doc = json!({
            "name": "a", "description": "d", "url": "http://h/rpc", "version": "1.0.0",
            "capabilities": {}, "defaultInputModes": ["text/plain"],
            "defaultOutputModes": ["text/plain"], "skills": []
        });
        if let (Some(base), Some(extra)) = (doc.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        AgentCard::validate(&doc).unwrap()
    }

    #[test]
    fn test_preferred_jsonrpc_uses_primary_url() {
        let c = card(json!({}));
        assert_eq!(pick_interface_url(&c, TRANSPORT_JSONRPC).as_deref(), Some("http://h/rpc"));
        assert_eq!(pick_interface_url(&c, TRANSPORT_HTTP_JSON), None);
    }

    #[test]
    fn test_falls_back_to_additional_interfaces() {
        let c = card(json!({
            "url": "http://h/v1",
            "preferredTransport": "HTTP+JSON",
            "additionalInterfaces": [
                {"url": "http://h/grpc", "transport": "GRPC"},
                {"url": "http://h/a2a/v1/jsonrpc", "transport": "JSONRPC"}
            ]
        }));
        assert_eq!(
            pick_interface_url(&c, TRANSPORT_JSONRPC).as_deref(),
            Some("http://h/a2a/v1/jsonrpc")
        );
        assert_eq!(pick_interface_url(&c, TRANSPORT_HTTP_JSON).as_deref(), Some("http://h/v1"));
    }
}

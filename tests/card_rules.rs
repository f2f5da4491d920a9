//! Descriptor rules through the public API: schema parse, then the
//! `AgentCard` rule set, as the suite runs them.

mod common;

use a2a_check::checks::{CardChecks, CardService};
use a2a_check::model::{Section, Severity};
use a2a_check::types::AgentCard;
use common::conforming_card;
use serde_json::{json, Value};

const CARD_URL: &str = "http://agent.test/.well-known/agent-card.json";

fn evaluate(raw: &Value) -> (Option<AgentCard>, Section) {
    let (card, _) = CardService::parse(raw);
    let section = CardChecks::new(CARD_URL, raw, card.as_ref()).run_section();
    (card, section)
}

fn failures<'a>(section: &'a Section, code: &'a str) -> Vec<&'a a2a_check::CheckOutcome> {
    section.find(code).filter(|o| !o.passed).collect()
}

#[test]
fn conforming_document_is_clean() {
    let (card, section) = evaluate(&conforming_card("http://agent.test"));
    assert!(card.is_some());
    assert!(section.outcomes.iter().all(|o| o.passed), "{section:?}");
}

#[test]
fn each_missing_core_field_is_one_error() {
    for (field, code) in [
        ("name", "CARD-002"),
        ("url", "CARD-003"),
        ("description", "CARD-004"),
        ("version", "CARD-005"),
        ("defaultInputModes", "CARD-006"),
        ("defaultOutputModes", "CARD-007"),
    ] {
        let mut raw = conforming_card("http://agent.test");
        raw.as_object_mut().unwrap().remove(field);
        let (card, section) = evaluate(&raw);

        assert!(card.is_none(), "{field} should be required by the schema");
        let failed = failures(&section, code);
        assert_eq!(failed.len(), 1, "{field}: {section:?}");
        assert_eq!(failed[0].severity, Severity::Error);
    }
}

#[test]
fn transport_conflict_names_the_url() {
    let mut raw = conforming_card("http://agent.test");
    raw["additionalInterfaces"] = json!([
        {"url": "http://agent.test/rpc", "transport": "JSONRPC"},
        {"url": "http://agent.test/rpc", "transport": "GRPC"}
    ]);
    let (_, section) = evaluate(&raw);

    let conflict = failures(&section, "CARD-012");
    assert_eq!(conflict.len(), 1);
    assert!(conflict[0].message.contains("http://agent.test/rpc -> [GRPC, JSONRPC]"));
}

#[test]
fn duplicate_skill_ids_listed_once() {
    let mut raw = conforming_card("http://agent.test");
    let skill = raw["skills"][0].clone();
    raw["skills"] = json!([skill.clone(), skill.clone(), skill]);
    let (card, section) = evaluate(&raw);

    assert!(card.is_some());
    let dup = failures(&section, "CARD-031");
    assert_eq!(dup.len(), 1);
    assert_eq!(dup[0].detail.as_ref().unwrap()["duplicates"], json!(["echo"]));
}

#[test]
fn warnings_do_not_fail_the_section() {
    let mut raw = conforming_card("http://agent.test");
    raw["protocolVersion"] = json!("0.2.6");
    raw["version"] = json!("2024-01");
    raw["skills"][0]["tags"] = json!([]);
    let (_, section) = evaluate(&raw);

    assert!(!section.has_failures(), "{section:?}");
    assert!(section.has_warnings());
    for code in ["CARD-001a", "CARD-005a", "CARD-033"] {
        assert_eq!(failures(&section, code)[0].severity, Severity::Warn, "{code}");
    }
}

#[test]
fn snake_case_aliases_are_accepted() {
    let raw = json!({
        "protocol_version": "0.3.0",
        "name": "Snake Agent",
        "description": "uses snake_case",
        "url": "http://agent.test/rpc",
        "preferred_transport": "JSONRPC",
        "additional_interfaces": [{"url": "http://agent.test/rpc", "transport": "JSONRPC"}],
        "version": "0.1.0",
        "capabilities": {"push_notifications": false},
        "default_input_modes": ["text/plain"],
        "default_output_modes": ["text/plain"],
        "skills": [{"id": "s", "name": "S", "description": "d", "tags": ["t"]}]
    });
    let (card, section) = evaluate(&raw);

    let card = card.expect("aliases resolve to canonical fields");
    assert_eq!(card.capabilities.push_notifications, Some(false));
    assert!(section.outcomes.iter().all(|o| o.passed), "{section:?}");
}

#[test]
fn rules_still_run_when_schema_fails() {
    let raw = json!({
        "name": "Broken",
        "capabilities": {"streaming": "yes"},
        "skills": [{"id": "a"}, {"id": "a"}]
    });
    let (card, section) = evaluate(&raw);

    assert!(card.is_none());
    assert_eq!(failures(&section, "CARD-020").len(), 1);
    assert_eq!(failures(&section, "CARD-031").len(), 1);
    assert_eq!(failures(&section, "CARD-032").len(), 1);
}

#[test]
fn missing_skill_tags_is_a_schema_error_and_a_tag_warning() {
    let mut raw = conforming_card("http://agent.test");
    raw["skills"][0].as_object_mut().unwrap().remove("tags");

    let (card, structure) = CardService::parse(&raw);
    assert!(card.is_none());
    assert_eq!(structure.rule_code, "CARD-STRUCT");
    assert_eq!(structure.severity, Severity::Error);
    assert!(structure.message.contains("skills[0].tags: field required"), "{}", structure.message);

    let section = CardChecks::new(CARD_URL, &raw, None).run_section();
    let tags = failures(&section, "CARD-033");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].severity, Severity::Warn);
    assert!(tags[0].message.contains("echo"));
    assert!(failures(&section, "CARD-030").is_empty());
    assert!(failures(&section, "CARD-032").is_empty());
}

#[test]
fn protocol_version_needs_a_patch_component() {
    for (version, accepted) in [("0.3.0", true), ("0.3.2", true), ("dev", true), ("0.3", false), ("0.4.0", false)] {
        let mut raw = conforming_card("http://agent.test");
        raw["protocolVersion"] = json!(version);
        let (_, section) = evaluate(&raw);

        let outcome = section.find("CARD-001a").next();
        if accepted {
            assert!(outcome.map_or(true, |o| o.passed), "{version}: {section:?}");
        } else {
            let outcome = outcome.expect("unexpected protocol version is reported");
            assert!(!outcome.passed, "{version}");
            assert_eq!(outcome.severity, Severity::Warn);
        }
    }
}

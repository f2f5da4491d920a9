//! Capability-descriptor rule set (`CARD-0xx`).
//!
//! Runs on the raw discovery document so that a document which failed schema
//! validation is still checked best-effort. Subgroups are independent: a
//! failure in one never suppresses another. Where the typed descriptor is
//! available the skill and security rules read it instead of the raw form.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::model::{CheckOutcome, Section};
use crate::types::{normalize_card_aliases, AgentCard};
use crate::utils::constants::{STANDARD_TRANSPORTS, SUPPORTED_PROTOCOL_SERIES};
use crate::utils::json::{format_list, is_present, is_truthy, type_name};

/// Title of the section this rule set produces.
pub const SECTION_TITLE: &str = "AgentCard";

fn semver_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?$").ok())
        .as_ref()
}

/// Whether `version` has `MAJOR.MINOR.PATCH[-pre]` shape.
pub fn is_semver(version: &str) -> bool {
    semver_re().map(|re| re.is_match(version)).unwrap_or(false)
}

/// Whether a declared protocol version is one this checker targets.
pub fn is_accepted_protocol_version(value: &Value) -> bool {
    match value.as_str() {
        Some("dev") => true,
        Some(v) => v
            .strip_prefix(SUPPORTED_PROTOCOL_SERIES)
            .map(|rest| rest.starts_with('.'))
            .unwrap_or(false),
        None => false,
    }
}

/// Display form of a JSON scalar for messages: strings unquoted.
fn show(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Discovery document with alias field names resolved to canonical form.
#[derive(Debug, Clone, Default)]
pub struct RawCard {
    doc: Map<String, Value>,
}

impl RawCard {
    /// Normalize `raw`. Non-object documents are treated as empty.
    pub fn new(raw: &Value) -> Self {
        match normalize_card_aliases(raw) {
            Value::Object(doc) => Self { doc },
            _ => Self::default(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.doc.get(field).filter(|v| !v.is_null())
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Array field, or an empty slice when absent or not an array.
    pub fn array(&self, field: &str) -> &[Value] {
        self.get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `capabilities` object, or an empty map.
    pub fn capabilities(&self) -> Option<&Map<String, Value>> {
        self.get("capabilities").and_then(Value::as_object)
    }

    /// `(url, transport)` of every object entry in `additionalInterfaces`.
    pub fn interfaces(&self) -> Vec<(Value, Value)> {
        self.array("additionalInterfaces")
            .iter()
            .filter_map(Value::as_object)
            .map(|i| {
                (
                    i.get("url").cloned().unwrap_or(Value::Null),
                    i.get("transport").cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.doc.clone())
    }
}

/// One skill as the skill rules see it.
struct SkillView {
    id: String,
    has_description: bool,
    has_tags: bool,
}

/// Descriptor rule set over one discovery document.
pub struct CardChecks<'a> {
    card_url: &'a str,
    raw: RawCard,
    card: Option<&'a AgentCard>,
}

impl<'a> CardChecks<'a> {
    pub fn new(card_url: &'a str, raw: &Value, card: Option<&'a AgentCard>) -> Self {
        Self {
            card_url,
            raw: RawCard::new(raw),
            card,
        }
    }

    /// Run every subgroup and collect one `AgentCard` section.
    pub fn run_section(&self) -> Section {
        tracing::debug!(card_url = %self.card_url, typed = self.card.is_some(), "descriptor rules");
        let mut s = Section::new(SECTION_TITLE);
        s.extend(self.core_presence());
        s.extend(self.transports());
        s.extend(self.capabilities());
        s.extend(self.skills());
        s.extend(self.security());
        s.extend(self.provider_and_meta());
        s
    }

    // ---------------------------------------------------------------------
    // Core fields
    // ---------------------------------------------------------------------

    fn core_presence(&self) -> Vec<CheckOutcome> {
        let mut out = Vec::new();
        let raw = &self.raw;

        match raw.get("protocolVersion") {
            Some(pv) => {
                out.push(CheckOutcome::pass(
                    "CARD-001",
                    format!("protocolVersion present ({})", show(pv)),
                ));
                out.push(if is_accepted_protocol_version(pv) {
                    CheckOutcome::pass(
                        "CARD-001a",
                        format!("protocolVersion acceptable ({})", show(pv)),
                    )
                } else {
                    CheckOutcome::warn(
                        "CARD-001a",
                        format!(
                            "protocolVersion unexpected ({}); expected {SUPPORTED_PROTOCOL_SERIES}.x or dev",
                            show(pv)
                        ),
                    )
                });
            }
            None => out.push(CheckOutcome::error("CARD-001", "protocolVersion missing")),
        }

        for (code, field) in [("CARD-002", "name"), ("CARD-003", "url"), ("CARD-004", "description")] {
            let ok = is_present(raw.get(field));
            out.push(CheckOutcome::check(
                code,
                ok,
                if ok {
                    format!("{field} present")
                } else {
                    format!("{field} missing")
                },
            ));
        }

        match raw.get("version") {
            Some(Value::String(v)) if !v.is_empty() => {
                out.push(CheckOutcome::pass("CARD-005", format!("version present ({v})")));
                if !is_semver(v) {
                    out.push(CheckOutcome::warn(
                        "CARD-005a",
                        format!("version not semver-like: {v}"),
                    ));
                }
            }
            Some(other) if !other.is_string() => out.push(CheckOutcome::error(
                "CARD-005",
                format!("version must be a string, got {}", type_name(other)),
            )),
            _ => out.push(CheckOutcome::error("CARD-005", "version missing")),
        }

        for (code, field) in [("CARD-006", "defaultInputModes"), ("CARD-007", "defaultOutputModes")] {
            let ok = raw
                .get(field)
                .and_then(Value::as_array)
                .map(|modes| !modes.is_empty() && modes.iter().all(Value::is_string))
                .unwrap_or(false);
            out.push(CheckOutcome::check(
                code,
                ok,
                if ok {
                    format!("{field} present")
                } else {
                    format!("{field} missing/invalid")
                },
            ));
        }

        out
    }

    // ---------------------------------------------------------------------
    // Transports
    // ---------------------------------------------------------------------

    fn transports(&self) -> Vec<CheckOutcome> {
        let mut out = Vec::new();
        let pref = self.raw.get("preferredTransport").filter(|v| is_truthy(v));
        let url = self.raw.get("url").filter(|v| is_truthy(v));
        let interfaces = self.raw.interfaces();

        out.push(match pref {
            Some(p) => CheckOutcome::pass("CARD-010", format!("preferredTransport present ({})", show(p))),
            None => CheckOutcome::error("CARD-010", "preferredTransport missing"),
        });

        let declared = !self.raw.array("additionalInterfaces").is_empty()
            || (pref.is_some() && url.is_some());
        out.push(CheckOutcome::check(
            "CARD-013",
            declared,
            if declared {
                "at least one transport declared"
            } else {
                "no transports declared"
            },
        ));

        let listed = match (pref, url) {
            (Some(p), Some(u)) => interfaces.iter().any(|(iu, it)| iu == u && it == p),
            _ => false,
        };
        out.push(CheckOutcome::check(
            "CARD-011",
            listed,
            if listed {
                "preferredTransport matches additionalInterfaces".to_string()
            } else {
                format!(
                    "preferredTransport/url pair ({} @ {}) missing from additionalInterfaces",
                    pref.map(show).unwrap_or_else(|| "-".into()),
                    url.map(show).unwrap_or_else(|| "-".into())
                )
            },
        ));

        let mut by_url: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (iu, it) in &interfaces {
            by_url.entry(show(iu)).or_default().insert(show(it));
        }
        let conflicts: Vec<String> = by_url
            .iter()
            .filter(|(_, kinds)| kinds.len() > 1)
            .map(|(u, kinds)| {
                let kinds: Vec<&str> = kinds.iter().map(String::as_str).collect();
                format!("{u} -> {}", format_list(&kinds))
            })
            .collect();
        out.push(if conflicts.is_empty() {
            CheckOutcome::pass("CARD-012", "no transport conflicts")
        } else {
            CheckOutcome::error(
                "CARD-012",
                format!("conflicting transport declarations: {}", conflicts.join("; ")),
            )
            .with_detail(json!({ "conflicts": conflicts }))
        });

        let mut bad: BTreeSet<String> = interfaces
            .iter()
            .map(|(_, it)| it)
            .filter(|it| !it.as_str().map(|t| STANDARD_TRANSPORTS.contains(&t)).unwrap_or(false))
            .map(show)
            .collect();
        if let Some(p) = pref {
            if !p.as_str().map(|t| STANDARD_TRANSPORTS.contains(&t)).unwrap_or(false) {
                bad.insert(show(p));
            }
        }
        out.push(if bad.is_empty() {
            CheckOutcome::pass("CARD-016", "transports use standard values")
        } else {
            let bad: Vec<String> = bad.into_iter().collect();
            CheckOutcome::warn(
                "CARD-016",
                format!("non-standard transport(s): {}", format_list(&bad)),
            )
        });

        out
    }

    // ---------------------------------------------------------------------
    // Capabilities
    // ---------------------------------------------------------------------

    fn capabilities(&self) -> Vec<CheckOutcome> {
        let mut out = Vec::new();
        let empty = Map::new();
        let caps = self.raw.capabilities().unwrap_or(&empty);

        for (code, flag) in [
            ("CARD-020", "streaming"),
            ("CARD-021", "pushNotifications"),
            ("CARD-022", "stateTransitionHistory"),
        ] {
            out.push(match caps.get(flag) {
                None | Some(Value::Null) => {
                    CheckOutcome::pass(code, format!("capabilities.{flag} absent"))
                }
                Some(Value::Bool(b)) => {
                    CheckOutcome::pass(code, format!("capabilities.{flag} is boolean ({b})"))
                }
                Some(other) => CheckOutcome::error(
                    code,
                    format!(
                        "capabilities.{flag} must be boolean or absent, got {} ({})",
                        type_name(other),
                        other
                    ),
                ),
            });
        }

        if let Some(exts) = caps.get("extensions").filter(|v| !v.is_null()) {
            let ok = exts
                .as_array()
                .map(|items| {
                    items.iter().all(|x| {
                        x.as_object()
                            .and_then(|o| o.get("uri"))
                            .map(Value::is_string)
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false);
            out.push(CheckOutcome::advise(
                "CARD-023",
                ok,
                if ok {
                    "capabilities.extensions valid"
                } else {
                    "capabilities.extensions invalid (expect objects with a uri)"
                },
            ));
        }

        out
    }

    // ---------------------------------------------------------------------
    // Skills
    // ---------------------------------------------------------------------

    fn skill_views(&self) -> Vec<SkillView> {
        if let Some(card) = self.card {
            return card
                .skills
                .iter()
                .map(|s| SkillView {
                    id: s.id.clone(),
                    has_description: !s.description.is_empty(),
                    has_tags: !s.tags.is_empty(),
                })
                .collect();
        }
        self.raw
            .array("skills")
            .iter()
            .filter_map(Value::as_object)
            .map(|s| SkillView {
                id: s.get("id").map(show).unwrap_or_else(|| "null".into()),
                has_description: is_present(s.get("description")),
                has_tags: s
                    .get("tags")
                    .and_then(Value::as_array)
                    .map(|t| !t.is_empty())
                    .unwrap_or(false),
            })
            .collect()
    }

    fn skills(&self) -> Vec<CheckOutcome> {
        let mut out = Vec::new();
        let skills = self.skill_views();
        let count = match self.card {
            Some(card) => card.skills.len(),
            None => self.raw.array("skills").len(),
        };

        out.push(CheckOutcome::check(
            "CARD-030",
            count > 0,
            if count > 0 {
                format!("skills present ({count})")
            } else {
                "skills missing".to_string()
            },
        ));

        let mut seen = HashSet::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for skill in &skills {
            if !seen.insert(skill.id.as_str()) && !duplicates.contains(&skill.id.as_str()) {
                duplicates.push(&skill.id);
            }
        }
        out.push(if duplicates.is_empty() {
            CheckOutcome::pass("CARD-031", "skill ids unique")
        } else {
            CheckOutcome::error(
                "CARD-031",
                format!("duplicate skill ids: {}", format_list(&duplicates)),
            )
            .with_detail(json!({ "duplicates": duplicates }))
        });

        let missing_desc: Vec<&str> = skills
            .iter()
            .filter(|s| !s.has_description)
            .map(|s| s.id.as_str())
            .collect();
        out.push(if missing_desc.is_empty() {
            CheckOutcome::pass("CARD-032", "all skills have description")
        } else {
            CheckOutcome::error(
                "CARD-032",
                format!("skills missing description: {}", format_list(&missing_desc)),
            )
        });

        let bad_tags: Vec<&str> = skills
            .iter()
            .filter(|s| !s.has_tags)
            .map(|s| s.id.as_str())
            .collect();
        out.push(if bad_tags.is_empty() {
            CheckOutcome::pass("CARD-033", "skills have non-empty tags")
        } else {
            CheckOutcome::warn(
                "CARD-033",
                format!("skills with empty/missing tags: {}", format_list(&bad_tags)),
            )
        });

        out
    }

    // ---------------------------------------------------------------------
    // Security
    // ---------------------------------------------------------------------

    /// Scheme names referenced by requirements, and scheme names declared.
    fn security_names(&self) -> (BTreeSet<String>, BTreeSet<String>) {
        if let Some(card) = self.card {
            let required = card
                .security
                .iter()
                .flatten()
                .flat_map(|req| req.keys().cloned())
                .collect();
            let declared = card
                .security_schemes
                .iter()
                .flat_map(|schemes| schemes.keys().cloned())
                .collect();
            return (required, declared);
        }
        let required = self
            .raw
            .array("security")
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|req| req.keys().cloned())
            .collect();
        let declared = self
            .raw
            .get("securitySchemes")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        (required, declared)
    }

    fn security(&self) -> Vec<CheckOutcome> {
        let mut out = Vec::new();
        let (required, declared) = self.security_names();

        if !is_present(self.raw.get("security")) {
            out.push(CheckOutcome::pass("CARD-040", "security optional and absent"));
        } else {
            let missing: Vec<&String> = required.difference(&declared).collect();
            out.push(if missing.is_empty() {
                CheckOutcome::pass("CARD-041", "security schemes declared")
            } else {
                CheckOutcome::error(
                    "CARD-041",
                    format!(
                        "security references missing in securitySchemes: {}",
                        format_list(&missing)
                    ),
                )
            });
        }

        let extended = self.raw.get("supportsAuthenticatedExtendedCard") == Some(&Value::Bool(true));
        if extended && declared.is_empty() {
            out.push(CheckOutcome::warn(
                "CARD-043",
                "supportsAuthenticatedExtendedCard=true but no securitySchemes declared",
            ));
        }

        out
    }

    // ---------------------------------------------------------------------
    // Provider / iconUrl
    // ---------------------------------------------------------------------

    fn provider_and_meta(&self) -> Vec<CheckOutcome> {
        let mut out = Vec::new();

        if let Some(provider) = self.raw.get("provider") {
            let ok = provider
                .as_object()
                .map(|p| {
                    p.get("organization").map(Value::is_string).unwrap_or(false)
                        && p.get("url").map(Value::is_string).unwrap_or(false)
                })
                .unwrap_or(false);
            out.push(CheckOutcome::advise(
                "CARD-050",
                ok,
                if ok {
                    "provider valid"
                } else {
                    "provider invalid (expect organization/url strings)"
                },
            ));
        }

        if let Some(icon) = self.raw.get("iconUrl").filter(|v| is_truthy(v)) {
            let ok = icon
                .as_str()
                .and_then(|s| reqwest::Url::parse(s).ok())
                .map(|u| {
                    matches!(u.scheme(), "http" | "https")
                        && u.host_str().map(|h| !h.is_empty()).unwrap_or(false)
                })
                .unwrap_or(false);
            out.push(CheckOutcome::advise(
                "CARD-051",
                ok,
                if ok {
                    "iconUrl looks valid".to_string()
                } else {
                    format!("iconUrl invalid: {}", show(icon))
                },
            ));
        }

        out
    }
}

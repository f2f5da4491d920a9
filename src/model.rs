//! Check outcomes, sections and the aggregated run report.
//!
//! A rule set produces a [`Section`]: an ordered list of [`CheckOutcome`]s.
//! The orchestrator collects sections into a [`RunReport`], which derives the
//! tally and exit code. Nothing here is mutated after it is handed on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How much a failed check matters. Independent of pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one rule against observed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Stable identifier of the kind of check, e.g. `CARD-031`.
    pub rule_code: String,
    pub passed: bool,
    /// Explanation, including observed values where they help.
    pub message: String,
    pub severity: Severity,
    /// Optional structured payload for machine consumers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl CheckOutcome {
    pub fn new(
        rule_code: impl Into<String>,
        passed: bool,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        CheckOutcome {
            rule_code: rule_code.into(),
            passed,
            message: message.into(),
            severity,
            detail: None,
        }
    }

    /// Passed, INFO severity.
    pub fn pass(rule_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_code, true, message, Severity::Info)
    }

    /// Failed, ERROR severity. Counts toward the verdict.
    pub fn error(rule_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_code, false, message, Severity::Error)
    }

    /// Failed, WARN severity. Advisory only.
    pub fn warn(rule_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_code, false, message, Severity::Warn)
    }

    /// Pass or ERROR depending on `ok`.
    pub fn check(rule_code: impl Into<String>, ok: bool, message: impl Into<String>) -> Self {
        let severity = if ok { Severity::Info } else { Severity::Error };
        Self::new(rule_code, ok, message, severity)
    }

    /// Pass or WARN depending on `ok`.
    pub fn advise(rule_code: impl Into<String>, ok: bool, message: impl Into<String>) -> Self {
        let severity = if ok { Severity::Info } else { Severity::Warn };
        Self::new(rule_code, ok, message, severity)
    }

    /// Attach a structured payload (builder-style).
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Failed with ERROR severity.
    pub fn is_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Error
    }

    /// Failed with WARN severity.
    pub fn is_warning(&self) -> bool {
        !self.passed && self.severity == Severity::Warn
    }
}

/// Named, ordered list of outcomes produced by one rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub outcomes: Vec<CheckOutcome>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Section {
            title: title.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn with_outcomes(title: impl Into<String>, outcomes: Vec<CheckOutcome>) -> Self {
        Section {
            title: title.into(),
            outcomes,
        }
    }

    pub fn push(&mut self, outcome: CheckOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn extend(&mut self, outcomes: impl IntoIterator<Item = CheckOutcome>) {
        self.outcomes.extend(outcomes);
    }

    /// At least one outcome failed with ERROR severity.
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(CheckOutcome::is_failure)
    }

    /// At least one outcome failed with WARN severity.
    pub fn has_warnings(&self) -> bool {
        self.outcomes.iter().any(CheckOutcome::is_warning)
    }

    /// Outcomes carrying `rule_code`, in emission order.
    pub fn find<'a>(&'a self, rule_code: &'a str) -> impl Iterator<Item = &'a CheckOutcome> + 'a {
        self.outcomes.iter().filter(move |o| o.rule_code == rule_code)
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Pass/warn/fail counts over a set of outcomes.
///
/// Failed outcomes below ERROR severity are counted as warnings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub passed: usize,
    pub warnings: usize,
    pub failures: usize,
}

impl Tally {
    fn add(&mut self, outcome: &CheckOutcome) {
        if outcome.passed {
            self.passed += 1;
        } else if outcome.severity == Severity::Error {
            self.failures += 1;
        } else {
            self.warnings += 1;
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} warnings, {} failures",
            self.passed, self.warnings, self.failures
        )
    }
}

/// Process exit status derived from a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Nothing counted against the target.
    Pass,
    /// At least one ERROR-severity failure.
    Fail,
    /// Strict mode only: no ERROR failures but some WARN failures.
    Warnings,
}

impl Verdict {
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
            Verdict::Warnings => 2,
        }
    }
}

/// Ordered sections of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub sections: Vec<Section>,
}

impl RunReport {
    pub fn new(sections: Vec<Section>) -> Self {
        RunReport { sections }
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.sections.iter().flat_map(|s| s.outcomes.iter())
    }

    pub fn has_failures(&self) -> bool {
        self.sections.iter().any(Section::has_failures)
    }

    pub fn has_warnings(&self) -> bool {
        self.sections.iter().any(Section::has_warnings)
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for outcome in self.outcomes() {
            tally.add(outcome);
        }
        tally
    }

    /// Verdict under the lenient (`strict = false`) or strict exit policy.
    pub fn verdict(&self, strict: bool) -> Verdict {
        if self.has_failures() {
            Verdict::Fail
        } else if strict && self.has_warnings() {
            Verdict::Warnings
        } else {
            Verdict::Pass
        }
    }

    pub fn exit_code(&self, strict: bool) -> i32 {
        self.verdict(strict).exit_code()
    }

    /// `(rule_code, passed, severity)` triples in report order.
    ///
    /// Two runs against an unchanged deterministic target yield identical
    /// signatures even when message text embeds generated ids.
    pub fn signature(&self) -> Vec<(String, bool, Severity)> {
        self.outcomes()
            .map(|o| (o.rule_code.clone(), o.passed, o.severity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn warn_failures_do_not_count_as_section_failures() {
        let mut section = Section::new("AgentCard");
        section.push(CheckOutcome::pass("CARD-002", "name ok"));
        section.push(CheckOutcome::warn("CARD-005a", "version '1.0' is not semver"));
        assert!(!section.has_failures());
        assert!(section.has_warnings());

        section.push(CheckOutcome::error("CARD-003", "description missing"));
        assert!(section.has_failures());
    }

    #[test]
    fn failed_info_neither_fails_nor_warns() {
        let outcome = CheckOutcome::new("X", false, "meh", Severity::Info);
        assert!(!outcome.is_failure());
        assert!(!outcome.is_warning());
        let report = RunReport::new(vec![Section::with_outcomes("S", vec![outcome])]);
        assert_eq!(report.exit_code(true), 0);
        assert_eq!(report.tally().warnings, 1);
    }

    #[test]
    fn exit_codes() {
        let clean = RunReport::new(vec![Section::with_outcomes(
            "Network",
            vec![CheckOutcome::pass("NET-001", "ok")],
        )]);
        assert_eq!(clean.exit_code(false), 0);
        assert_eq!(clean.exit_code(true), 0);

        let warned = RunReport::new(vec![Section::with_outcomes(
            "AgentCard",
            vec![CheckOutcome::warn("CARD-033", "tags")],
        )]);
        assert_eq!(warned.exit_code(false), 0);
        assert_eq!(warned.exit_code(true), 2);

        let mut failed = warned.clone();
        failed.push(Section::with_outcomes(
            "JSON-RPC",
            vec![CheckOutcome::error("RPC-001", "bad code")],
        ));
        assert_eq!(failed.exit_code(false), 1);
        assert_eq!(failed.exit_code(true), 1);
    }

    #[test]
    fn tally_counts() {
        let report = RunReport::new(vec![Section::with_outcomes(
            "S",
            vec![
                CheckOutcome::pass("A", ""),
                CheckOutcome::pass("B", ""),
                CheckOutcome::warn("C", ""),
                CheckOutcome::error("D", ""),
            ],
        )]);
        let tally = report.tally();
        assert_eq!(
            tally,
            Tally {
                passed: 2,
                warnings: 1,
                failures: 1
            }
        );
        assert_eq!(tally.to_string(), "2 passed, 1 warnings, 1 failures");
    }

    #[test]
    fn outcome_serializes_with_uppercase_severity() {
        let outcome = CheckOutcome::error("RPC-001", "unexpected code -32000")
            .with_detail(json!({"code": -32000}));
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["rule_code"], "RPC-001");
        assert_eq!(v["severity"], "ERROR");
        assert_eq!(v["passed"], false);
        assert_eq!(v["detail"]["code"], -32000);

        let bare = serde_json::to_value(CheckOutcome::pass("A", "b")).unwrap();
        assert!(bare.get("detail").is_none());
    }

    #[test]
    fn check_and_advise_pick_severity() {
        assert_eq!(CheckOutcome::check("A", true, "").severity, Severity::Info);
        assert_eq!(CheckOutcome::check("A", false, "").severity, Severity::Error);
        assert_eq!(CheckOutcome::advise("A", false, "").severity, Severity::Warn);
    }

    #[test]
    fn find_returns_repeated_codes_in_order() {
        let section = Section::with_outcomes(
            "AgentCard",
            vec![
                CheckOutcome::warn("CARD-016", "first"),
                CheckOutcome::pass("CARD-010", ""),
                CheckOutcome::warn("CARD-016", "second"),
            ],
        );
        let msgs: Vec<&str> = section.find("CARD-016").map(|o| o.message.as_str()).collect();
        assert_eq!(msgs, vec!["first", "second"]);
    }
}

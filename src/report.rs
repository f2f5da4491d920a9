//! Report rendering.
//!
//! Both renderers borrow the [`RunReport`] and never change it. The text form
//! is aligned for reading in a terminal; the JSON form is the serialised
//! report plus its tally and exit code.

use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::{CheckOutcome, RunReport, Section, Severity, Tally};

/// Output format selectable on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Status marker for one outcome.
pub fn status_marker(outcome: &CheckOutcome) -> &'static str {
    if outcome.passed {
        "PASS"
    } else {
        match outcome.severity {
            Severity::Error => "FAIL",
            Severity::Warn => "WARN",
            Severity::Info => "INFO-FAIL",
        }
    }
}

fn render_section(out: &mut String, section: &Section) {
    let _ = writeln!(out, "== {} ==", section.title);
    if section.is_empty() {
        let _ = writeln!(out, "  (no checks)");
        return;
    }
    let width = section
        .outcomes
        .iter()
        .map(|o| o.rule_code.len())
        .max()
        .unwrap_or(0);
    for outcome in &section.outcomes {
        let _ = writeln!(
            out,
            "  {:<9} {:<width$}  {}",
            status_marker(outcome),
            outcome.rule_code,
            outcome.message,
        );
    }
}

/// Human-readable report: one block per section, then the tally line.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    for (i, section) in report.sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_section(&mut out, section);
    }
    if !report.sections.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "{}", report.tally());
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    tool: &'static str,
    version: &'static str,
    generated_at: String,
    #[serde(flatten)]
    report: &'a RunReport,
    tally: Tally,
    strict: bool,
    exit_code: i32,
}

/// Machine-readable report.
pub fn render_json(report: &RunReport, strict: bool) -> serde_json::Result<Value> {
    serde_json::to_value(JsonReport {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        report,
        tally: report.tally(),
        strict,
        exit_code: report.exit_code(strict),
    })
}

/// Render in `format`, ready for stdout.
pub fn render(report: &RunReport, format: Format, strict: bool) -> serde_json::Result<String> {
    match format {
        Format::Text => Ok(render_text(report)),
        Format::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&render_json(report, strict)?)?)),
    }
}

//! # a2a-check — compliance checker for Agent-to-Agent (A2A) protocol servers
//!
//! This crate probes a remote [A2A](https://a2a-protocol.org/latest/specification/)
//! server and reports how well it follows protocol v0.3: whether its
//! discovery document (the *agent card*) is reachable and well-formed, and
//! whether its JSON-RPC and HTTP+JSON interfaces behave as required.
//!
//! ## Overview
//!
//! A run produces a [`RunReport`]: an ordered list of [`Section`]s, each
//! holding [`CheckOutcome`]s with a stable rule code, a pass/fail flag and a
//! [`Severity`]. Only ERROR-severity failures fail a run; WARN failures fail
//! it only under the strict exit policy, INFO never does.
//!
//! The crate provides:
//! - **Rule sets** for the discovery document, JSON-RPC and HTTP+JSON ([`checks`])
//! - **Suite orchestration** tying them together per command ([`Suite`])
//! - **A pluggable transport** with an HTTP implementation ([`client::Transport`])
//! - **Text and JSON renderers** for reports ([`report`])
//! - **A demo target server** with conforming and deliberately broken modes (`server`)
//!
//! ## Feature flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | yes     | axum demo target, required by the `a2a-check` binary |
//!
//! ## Quick Start
//!
//! ```no_run
//! use a2a_check::client::HttpTransport;
//! use a2a_check::{report, Settings, Suite};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let transport = HttpTransport::new(&settings)?;
//!
//!     let run = Suite::new(&transport, &settings)
//!         .run_all("localhost:9999", None)
//!         .await;
//!
//!     print!("{}", report::render(&run, report::Format::Text, false)?);
//!     std::process::exit(run.exit_code(false));
//! }
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Protocol wire types and the agent card schema |
//! | [`model`] | Outcomes, sections, reports and verdicts |
//! | [`checks`] | Rule sets |
//! | [`client`] | Transport, discovery URL resolution, JSON-RPC and SSE helpers |
//! | [`suite`] | Per-command orchestration |
//! | [`report`] | Text and JSON rendering |
//! | [`config`] | Run settings |
//! | [`error`] | Error types and JSON-RPC error codes |
//! | [`telemetry`] | Tracing setup for the binary |
//! | [`utils`] | Constants and JSON helpers |

pub mod checks;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod report;
pub mod suite;
pub mod telemetry;
pub mod types;
pub mod utils;

#[cfg(feature = "server")]
pub mod server;

pub use config::Settings;
pub use error::{ProbeError, ProbeResult};
pub use model::{CheckOutcome, RunReport, Section, Severity, Tally, Verdict};
pub use suite::Suite;
pub use types::{AgentCard, FieldError};

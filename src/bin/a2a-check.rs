//! `a2a-check` — compliance checker for A2A protocol servers.
//!
//! ## Commands
//!
//! - `net probe`: origin and discovery-endpoint reachability
//! - `card fetch` / `card validate`: fetch, schema-check and lint the descriptor
//! - `rpc ping` / `rpc ping-from-card` / `rpc stream`: JSON-RPC rule set
//! - `rest check` / `rest check-from-card`: HTTP+JSON rule set
//! - `suite all`: the full orchestrated run
//! - `demo serve`: start the reference target
//!
//! Exit codes: 0 when everything passed, 1 on any ERROR-severity failure,
//! 2 with `--fail-on-warn` when only WARN-severity failures were found.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use a2a_check::client::HttpTransport;
use a2a_check::report::{self, Format};
use a2a_check::server::{self, DemoMode};
use a2a_check::suite::{Suite, DEFAULT_STREAM_TEXT};
use a2a_check::utils::constants::AGENT_CARD_WELL_KNOWN_PATH;
use a2a_check::{telemetry, Settings};

#[derive(Parser)]
#[command(name = "a2a-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compliance checker for Agent-to-Agent (A2A) protocol servers", long_about = None)]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Network reachability probes
    Net {
        #[command(subcommand)]
        cmd: NetCmd,
    },
    /// Discovery document checks
    Card {
        #[command(subcommand)]
        cmd: CardCmd,
    },
    /// JSON-RPC checks
    Rpc {
        #[command(subcommand)]
        cmd: RpcCmd,
    },
    /// HTTP+JSON checks
    Rest {
        #[command(subcommand)]
        cmd: RestCmd,
    },
    /// Orchestrated suites
    Suite {
        #[command(subcommand)]
        cmd: SuiteCmd,
    },
    /// Reference target server
    Demo {
        #[command(subcommand)]
        cmd: DemoCmd,
    },
}

#[derive(Subcommand)]
enum NetCmd {
    /// Probe the origin and the discovery endpoint
    Probe {
        /// Base URL or discovery-document URL
        target: String,
        #[command(flatten)]
        opts: ProbeOpts,
    },
}

#[derive(Subcommand)]
enum CardCmd {
    /// Fetch, schema-check and lint the discovery document
    Fetch(TargetArgs),
    /// Same as `fetch`
    Validate(TargetArgs),
}

#[derive(Subcommand)]
enum RpcCmd {
    /// Run the JSON-RPC rule set against an endpoint (streaming disabled)
    Ping {
        /// JSON-RPC endpoint URL
        url: String,
        #[command(flatten)]
        opts: ProbeOpts,
    },
    /// Resolve the JSON-RPC endpoint from the descriptor, then ping it
    PingFromCard(TargetArgs),
    /// Check that message/stream yields at least one SSE event
    Stream {
        /// JSON-RPC endpoint URL
        url: String,
        /// Text of the streamed message
        #[arg(long, default_value = DEFAULT_STREAM_TEXT)]
        text: String,
        #[command(flatten)]
        opts: ProbeOpts,
    },
}

#[derive(Subcommand)]
enum RestCmd {
    /// Run the HTTP+JSON rule set against a base URL
    Check {
        /// Base URL, with or without the trailing `/v1`
        base: String,
        #[command(flatten)]
        opts: ProbeOpts,
    },
    /// Resolve the HTTP+JSON base from the descriptor, then check it
    CheckFromCard(TargetArgs),
}

#[derive(Subcommand)]
enum SuiteCmd {
    /// Network, descriptor, JSON-RPC and HTTP+JSON checks in order
    All(TargetArgs),
}

#[derive(Subcommand)]
enum DemoCmd {
    /// Serve the reference target
    Serve(DemoArgs),
}

/// A target whose descriptor is fetched first.
#[derive(Args)]
struct TargetArgs {
    /// Base URL or discovery-document URL
    target: String,

    /// Explicit discovery-document URL (skips resolution)
    #[arg(long)]
    card_url: Option<String>,

    #[command(flatten)]
    opts: ProbeOpts,
}

/// Options shared by every probe command.
#[derive(Args)]
struct ProbeOpts {
    /// Request timeout in seconds
    #[arg(long, default_value = "8", value_parser = parse_secs)]
    timeout: Duration,

    /// SSE stream deadline in seconds
    #[arg(long, default_value = "12", value_parser = parse_secs)]
    stream_timeout: Duration,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Path of the discovery document below the origin
    #[arg(long, default_value = AGENT_CARD_WELL_KNOWN_PATH)]
    well_known_path: String,

    /// Bearer token for authenticated requests
    #[arg(long, env = "A2A_CHECK_BEARER", hide_env_values = true)]
    auth_bearer: Option<String>,

    /// Extra request header, repeatable
    #[arg(long = "header", value_name = "K=V", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Exit 2 when only warnings were found
    #[arg(long)]
    fail_on_warn: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

impl ProbeOpts {
    fn settings(&self) -> Settings {
        self.headers.iter().fold(
            Settings::default()
                .with_timeout(self.timeout)
                .with_stream_timeout(self.stream_timeout)
                .with_verify_tls(!self.insecure)
                .with_well_known_path(self.well_known_path.clone())
                .with_bearer_token(self.auth_bearer.clone()),
            |settings, (key, value)| settings.with_header(key.clone(), value.clone()),
        )
    }
}

#[derive(Args)]
struct DemoArgs {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port
    #[arg(long, default_value_t = 9999)]
    port: u16,

    /// Behaviour profile
    #[arg(long, value_enum, default_value_t = DemoMode::Ok)]
    mode: DemoMode,

    /// Base URL advertised in the descriptor (defaults to the bound address)
    #[arg(long)]
    public_url: Option<String>,
}

fn parse_secs(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("invalid seconds '{s}': {e}"))?;
    if secs <= 0.0 {
        return Err(format!("timeout must be positive, got {s}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid seconds '{s}': {e}"))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected K=V, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty header name in '{s}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// One probe command, with its inputs.
enum Probe {
    Net { target: String },
    Card { target: String, card_url: Option<String> },
    RpcPing { url: String },
    RpcPingFromCard { target: String, card_url: Option<String> },
    RpcStream { url: String, text: String },
    Rest { base: String },
    RestFromCard { target: String, card_url: Option<String> },
    SuiteAll { target: String, card_url: Option<String> },
}

async fn run_probe(opts: ProbeOpts, probe: Probe) -> Result<ExitCode> {
    let settings = opts.settings();
    debug!(
        timeout = ?settings.timeout,
        stream_timeout = ?settings.stream_timeout,
        verify_tls = settings.verify_tls,
        bearer = %settings.masked_bearer(),
        "settings"
    );
    let transport = HttpTransport::new(&settings).context("failed to build HTTP client")?;
    let suite = Suite::new(&transport, &settings);

    let report = match probe {
        Probe::Net { target } => suite.net_probe(&target).await,
        Probe::Card { target, card_url } => suite.card(&target, card_url.as_deref()).await,
        Probe::RpcPing { url } => suite.rpc_ping(&url).await,
        Probe::RpcPingFromCard { target, card_url } => {
            suite.rpc_ping_from_card(&target, card_url.as_deref()).await
        }
        Probe::RpcStream { url, text } => suite.rpc_stream(&url, &text).await,
        Probe::Rest { base } => suite.rest_check(&base).await,
        Probe::RestFromCard { target, card_url } => {
            suite.rest_check_from_card(&target, card_url.as_deref()).await
        }
        Probe::SuiteAll { target, card_url } => suite.run_all(&target, card_url.as_deref()).await,
    };

    let rendered =
        report::render(&report, opts.format, opts.fail_on_warn).context("failed to render report")?;
    print!("{rendered}");

    let code = report.exit_code(opts.fail_on_warn);
    info!(code, "exit");
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

async fn serve_demo(args: DemoArgs) -> Result<ExitCode> {
    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;
    eprintln!(
        "a2a-check demo target ({}) on http://{}",
        args.mode,
        listener.local_addr().context("failed to read bound address")?
    );
    server::serve(listener, args.mode, args.public_url)
        .await
        .context("demo server failed")?;
    Ok(ExitCode::SUCCESS)
}

fn target_probe(args: TargetArgs, make: fn(String, Option<String>) -> Probe) -> (ProbeOpts, Probe) {
    (args.opts, make(args.target, args.card_url))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose, cli.log_json);

    let (opts, probe) = match cli.command {
        Commands::Demo {
            cmd: DemoCmd::Serve(args),
        } => return serve_demo(args).await,
        Commands::Net {
            cmd: NetCmd::Probe { target, opts },
        } => (opts, Probe::Net { target }),
        Commands::Card {
            cmd: CardCmd::Fetch(args) | CardCmd::Validate(args),
        } => target_probe(args, |target, card_url| Probe::Card { target, card_url }),
        Commands::Rpc {
            cmd: RpcCmd::Ping { url, opts },
        } => (opts, Probe::RpcPing { url }),
        Commands::Rpc {
            cmd: RpcCmd::PingFromCard(args),
        } => target_probe(args, |target, card_url| Probe::RpcPingFromCard {
            target,
            card_url,
        }),
        Commands::Rpc {
            cmd: RpcCmd::Stream { url, text, opts },
        } => (opts, Probe::RpcStream { url, text }),
        Commands::Rest {
            cmd: RestCmd::Check { base, opts },
        } => (opts, Probe::Rest { base }),
        Commands::Rest {
            cmd: RestCmd::CheckFromCard(args),
        } => target_probe(args, |target, card_url| Probe::RestFromCard {
            target,
            card_url,
        }),
        Commands::Suite {
            cmd: SuiteCmd::All(args),
        } => target_probe(args, |target, card_url| Probe::SuiteAll { target, card_url }),
    };

    run_probe(opts, probe).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn header_and_seconds_parsing() {
        assert_eq!(
            parse_header("X-Trace = abc").unwrap(),
            ("X-Trace".to_string(), "abc".to_string())
        );
        assert!(parse_header("novalue").is_err());
        assert!(parse_header("=v").is_err());
        assert_eq!(parse_secs("1.5").unwrap(), Duration::from_millis(1500));
        assert!(parse_secs("0").is_err());
        assert!(parse_secs("-3").is_err());
    }

    #[test]
    fn enum_options_default_and_reject_unknown_values() {
        let cli = Cli::parse_from(["a2a-check", "demo", "serve", "--mode", "warn"]);
        let Commands::Demo {
            cmd: DemoCmd::Serve(args),
        } = cli.command
        else {
            panic!("expected demo serve");
        };
        assert_eq!(args.mode, DemoMode::Warn);

        let cli = Cli::parse_from(["a2a-check", "demo", "serve"]);
        let Commands::Demo {
            cmd: DemoCmd::Serve(args),
        } = cli.command
        else {
            panic!("expected demo serve");
        };
        assert_eq!(args.mode, DemoMode::Ok);

        let cli = Cli::parse_from(["a2a-check", "net", "probe", "localhost"]);
        let Commands::Net {
            cmd: NetCmd::Probe { opts, .. },
        } = cli.command
        else {
            panic!("expected net probe");
        };
        assert_eq!(opts.format, Format::Text);

        let bad_format = Cli::try_parse_from(["a2a-check", "net", "probe", "x", "--format", "yaml"]);
        assert!(bad_format.is_err());
        let bad_mode = Cli::try_parse_from(["a2a-check", "demo", "serve", "--mode", "broken"]);
        assert!(bad_mode.is_err());
    }

    #[test]
    fn probe_options_build_settings() {
        let cli = Cli::parse_from([
            "a2a-check",
            "suite",
            "all",
            "localhost:9999",
            "--insecure",
            "--well-known-path",
            "custom/card.json",
            "--header",
            "X-A=1",
            "--fail-on-warn",
            "--format",
            "json",
        ]);
        let Commands::Suite {
            cmd: SuiteCmd::All(args),
        } = cli.command
        else {
            panic!("expected suite all");
        };
        let settings = args.opts.settings();
        assert!(!settings.verify_tls);
        assert_eq!(settings.well_known_path, "/custom/card.json");
        assert_eq!(settings.extra_headers.get("X-A").map(String::as_str), Some("1"));
        assert!(args.opts.fail_on_warn);
        assert_eq!(args.opts.format, Format::Json);
    }
}

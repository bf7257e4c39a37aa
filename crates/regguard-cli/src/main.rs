//! RegGuard CLI
//!
//! Runs content through the compliance engine from the command line.
//! Reports go to stdout, logs to stderr. The exit status is 2 when any
//! checked input is non-compliant.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod output;

#[derive(Parser, Debug)]
#[command(name = "regguard")]
#[command(about = "Heuristic regulatory compliance checks", long_about = None)]
struct Cli {
    /// Engine configuration file (YAML); all built-in modules when omitted
    #[arg(short, long, global = true, env = "REGGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate content against every enabled module
    Check(CheckArgs),

    /// Describe every enabled module
    Requirements {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// List registered modules and whether they are enabled
    List,

    /// Verify the hash chain of an audit log
    VerifyAudit {
        /// JSON-lines audit log
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Files to check; reads stdin when none are given
    #[arg(short, long = "input")]
    inputs: Vec<PathBuf>,

    /// Context entry as key=value; values that parse as JSON keep their type
    #[arg(short = 'x', long = "context", value_parser = commands::parse_context_entry)]
    context: Vec<(String, serde_json::Value)>,

    /// Disable a module for this run
    #[arg(short, long = "disable")]
    disable: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Append one hash-chained event per checked input to this file
    #[arg(long)]
    audit_log: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);
    describe_metrics();

    let engine = commands::load_engine(cli.config.as_deref())?;

    match cli.command {
        Command::Check(args) => commands::check(&engine, args).await,
        Command::Requirements { format } => commands::requirements(&engine, format),
        Command::List => commands::list(&engine),
        Command::VerifyAudit { path } => commands::verify_audit(&path),
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("regguard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("regguard=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Register descriptions for the metrics the engine emits
fn describe_metrics() {
    metrics::describe_counter!("regguard_rounds_total", "Total number of compliance rounds");
    metrics::describe_counter!(
        "regguard_non_compliant_rounds_total",
        "Rounds whose overall verdict was non-compliant"
    );
    metrics::describe_counter!(
        "regguard_violations_total",
        "Violations reported, by severity"
    );
    metrics::describe_counter!(
        "regguard_module_failures_total",
        "Module evaluations that errored or panicked, by module"
    );
    metrics::describe_histogram!(
        "regguard_round_latency_us",
        metrics::Unit::Microseconds,
        "Compliance round latency in microseconds"
    );
}

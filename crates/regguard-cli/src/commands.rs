//! Subcommand implementations

use crate::output;
use crate::{CheckArgs, Format};
use anyhow::{Context as _, Result};
use regguard_core::{ComplianceReport, Context};
use regguard_engine::{ComplianceEngine, EngineConfig};
use regguard_telemetry::{AuditEvent, AuditTrail, MetricsCollector};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Exit status when any checked input is non-compliant
const EXIT_NON_COMPLIANT: u8 = 2;

/// Build the engine from a config file, or with every built-in module
pub fn load_engine(path: Option<&Path>) -> Result<ComplianceEngine> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            EngineConfig::from_file(path)?
        }
        None => EngineConfig::default(),
    };
    Ok(ComplianceEngine::from_config(&config)?)
}

/// Parse a `key=value` context entry
pub fn parse_context_entry(raw: &str) -> std::result::Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty context key in '{}'", raw));
    }

    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// One checked input
struct Checked {
    source: String,
    report: ComplianceReport,
}

pub async fn check(engine: &ComplianceEngine, args: CheckArgs) -> Result<ExitCode> {
    for name in &args.disable {
        if !engine.set_module_enabled(name, false) {
            warn!("Cannot disable unknown module '{}'", name);
        }
    }

    let context: Context = args.context.into_iter().collect();
    let metrics = MetricsCollector::new();
    let mut checked = Vec::new();

    for (source, content) in read_inputs(&args.inputs)? {
        let start = Instant::now();
        let report = engine.check_compliance(&content, &context).await;
        metrics.record_report(&report, start.elapsed().as_micros() as u64);

        debug!(source = %source, compliant = report.overall_compliant, "input checked");
        checked.push(Checked { source, report });
    }

    if let Some(path) = &args.audit_log {
        append_audit(path, &checked)?;
    }

    let snapshot = metrics.snapshot();
    info!(
        rounds = snapshot.total_rounds,
        non_compliant = snapshot.non_compliant_rounds,
        violations = snapshot.total_violations,
        module_failures = snapshot.module_failures,
        avg_latency_us = snapshot.avg_latency_us(),
        "check finished"
    );

    match args.format {
        Format::Json => {
            let json = match checked.as_slice() {
                [single] => serde_json::to_string_pretty(&single.report)?,
                many => {
                    let entries: Vec<_> = many
                        .iter()
                        .map(|c| serde_json::json!({ "input": c.source, "report": c.report }))
                        .collect();
                    serde_json::to_string_pretty(&entries)?
                }
            };
            println!("{}", json);
        }
        Format::Text => {
            for c in &checked {
                print!(
                    "{}",
                    output::ReportView {
                        source: &c.source,
                        report: &c.report,
                    }
                );
            }
            if checked.len() > 1 {
                println!("{}", output::render_totals(&snapshot));
            }
        }
    }

    if checked.iter().all(|c| c.report.overall_compliant) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_NON_COMPLIANT))
    }
}

pub fn requirements(engine: &ComplianceEngine, format: Format) -> Result<ExitCode> {
    let requirements = engine.get_requirements();
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&requirements)?),
        Format::Text => print!("{}", output::RequirementsView(&requirements)),
    }
    Ok(ExitCode::SUCCESS)
}

pub fn list(engine: &ComplianceEngine) -> Result<ExitCode> {
    let registry = engine.registry();
    for name in engine.list_available_modules() {
        let state = match registry.is_enabled(&name) {
            Some(true) => "enabled",
            _ => "disabled",
        };
        println!("{:<24} {}", name, state);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn verify_audit(path: &Path) -> Result<ExitCode> {
    let trail = AuditTrail::load_jsonl(path)
        .with_context(|| format!("Failed to read audit log {}", path.display()))?;

    match trail.first_broken_link() {
        None => {
            println!("{}: {} events, chain intact", path.display(), trail.len());
            Ok(ExitCode::SUCCESS)
        }
        Some(index) => {
            println!(
                "{}: chain broken at event {} of {}",
                path.display(),
                index + 1,
                trail.len()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<(String, String)>> {
    if paths.is_empty() {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return Ok(vec![("<stdin>".to_string(), content)]);
    }

    paths
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((path.display().to_string(), content))
        })
        .collect()
}

fn append_audit(path: &Path, checked: &[Checked]) -> Result<()> {
    let mut trail = AuditTrail::load_jsonl(path)
        .with_context(|| format!("Failed to read audit log {}", path.display()))?;
    if let Some(index) = trail.first_broken_link() {
        warn!(
            "Audit log {} fails verification at event {}; appending anyway",
            path.display(),
            index + 1
        );
    }

    let start = trail.len();
    for c in checked {
        let event = AuditEvent::from_report(&c.report).with_source(&c.source);
        trail.add_event(event);
    }
    trail
        .append_jsonl(path, start)
        .with_context(|| format!("Failed to write audit log {}", path.display()))?;

    info!("Appended {} audit events to {}", checked.len(), path.display());
    Ok(())
}

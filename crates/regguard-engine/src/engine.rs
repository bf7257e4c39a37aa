//! Compliance orchestrator
//!
//! Runs one evaluation round over the enabled modules, isolating every
//! module so that an error or panic in one of them becomes a `MODULE_ERROR`
//! result for that module only.

use crate::aggregator::build_report;
use crate::config::EngineConfig;
use crate::registry::ModuleRegistry;
use futures::future::join_all;
use futures::FutureExt;
use regguard_core::{
    ComplianceReport, Context, ModuleConfig, ModuleResult, ModuleResults, RequirementsEntry,
    RequirementsMap, Result, Severity,
};
use regguard_modules::{ModuleKind, PolicyModule};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Evaluates content against every enabled policy module
pub struct ComplianceEngine {
    registry: ModuleRegistry,
}

impl ComplianceEngine {
    /// Create an engine with no modules
    pub fn new() -> Self {
        Self::with_registry(ModuleRegistry::new())
    }

    /// Create an engine around an existing registry
    pub fn with_registry(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Create an engine with every built-in module enabled
    pub fn with_default_modules() -> Result<Self> {
        Self::from_config(&EngineConfig::default())
    }

    /// Create an engine from configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let engine = Self::new();

        for spec in &config.modules {
            let name = spec.registry_name();
            let module = spec.kind.build(&spec.config)?;
            engine.registry.register_with(name, module, false)?;
            engine.registry.set_enabled(name, spec.enabled);
        }

        info!(
            "Engine initialized with {} modules ({} enabled)",
            engine.registry.len(),
            engine.registry.enabled_names().len()
        );
        Ok(engine)
    }

    /// The underlying registry
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Evaluate content against every enabled module.
    ///
    /// The set of modules is fixed when the round starts. Modules run
    /// concurrently; results are reported in registry order. This never
    /// fails: module errors and panics are reported as `MODULE_ERROR`
    /// violations in that module's slot.
    pub async fn check_compliance(&self, content: &str, context: &Context) -> ComplianceReport {
        let start = Instant::now();
        let snapshot = self.registry.enabled_modules();

        let evaluations = snapshot.iter().map(|(name, module)| async move {
            debug!(module = %name, "evaluating module");
            let outcome = AssertUnwindSafe(async { module.evaluate(content, context).await })
                .catch_unwind()
                .await;
            (name.clone(), isolate(name, outcome))
        });

        let results: ModuleResults = join_all(evaluations).await.into_iter().collect();
        let report = build_report(results);

        record_round(&report, start);
        info!(
            modules = report.module_results.len(),
            violations = report.summary.total_violations,
            compliant = report.overall_compliant,
            "compliance round complete"
        );

        report
    }

    /// Evaluate content with an empty context
    pub async fn check_compliance_default(&self, content: &str) -> ComplianceReport {
        self.check_compliance(content, &Context::new()).await
    }

    /// Describe every enabled module.
    ///
    /// A module whose `describe` fails or panics is reported with an error
    /// placeholder instead of aborting the call.
    pub fn get_requirements(&self) -> RequirementsMap {
        self.registry
            .enabled_modules()
            .into_iter()
            .map(|(name, module)| {
                let entry = match catch_unwind(AssertUnwindSafe(|| module.describe())) {
                    Ok(Ok(requirements)) => RequirementsEntry::Described(requirements),
                    Ok(Err(e)) => {
                        warn!(module = %name, error = %e, "describe failed");
                        RequirementsEntry::Unavailable {
                            error: e.to_string(),
                        }
                    }
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        warn!(module = %name, panic = %message, "describe panicked");
                        RequirementsEntry::Unavailable {
                            error: format!("module panicked: {}", message),
                        }
                    }
                };
                (name, entry)
            })
            .collect()
    }

    /// Enable or disable a module; unknown names are ignored.
    /// Returns whether the name was registered.
    pub fn set_module_enabled(&self, name: &str, enabled: bool) -> bool {
        self.registry.set_enabled(name, enabled)
    }

    /// Construct a built-in module and register it, replacing any module
    /// already registered under `name`
    pub fn register_module(&self, name: &str, kind: ModuleKind, config: &ModuleConfig) -> Result<()> {
        let module = kind.build(config)?;
        self.registry.register(name, module);
        Ok(())
    }

    /// Register an externally constructed module, replacing any module
    /// already registered under `name`
    pub fn register_instance(&self, name: &str, module: Arc<dyn PolicyModule>) {
        self.registry.register(name, module);
    }

    /// Rebuild a registered module from new options
    pub fn reconfigure_module(&self, name: &str, config: &ModuleConfig) -> Result<()> {
        self.registry.reconfigure(name, config)
    }

    /// Every registered module name, in registration order
    pub fn list_available_modules(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Enabled module names, in registration order
    pub fn enabled_modules(&self) -> Vec<String> {
        self.registry.enabled_names()
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a module's raw outcome into a result for its report slot
fn isolate(name: &str, outcome: std::thread::Result<Result<ModuleResult>>) -> ModuleResult {
    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            warn!(module = %name, error = %e, "module failed, isolating");
            metrics::counter!("regguard_module_failures_total", "module" => name.to_string())
                .increment(1);
            ModuleResult::module_error(format!("Module '{}' failed: {}", name, e))
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(module = %name, panic = %message, "module panicked, isolating");
            metrics::counter!("regguard_module_failures_total", "module" => name.to_string())
                .increment(1);
            ModuleResult::module_error(format!("Module '{}' panicked: {}", name, message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn record_round(report: &ComplianceReport, start: Instant) {
    metrics::counter!("regguard_rounds_total").increment(1);
    if !report.overall_compliant {
        metrics::counter!("regguard_non_compliant_rounds_total").increment(1);
    }
    for severity in Severity::ALL {
        let count = report.summary.count(severity) as u64;
        if count > 0 {
            metrics::counter!("regguard_violations_total", "severity" => severity.as_str())
                .increment(count);
        }
    }
    metrics::histogram!("regguard_round_latency_us").record(start.elapsed().as_micros() as f64);
}

//! Policy module trait and shared helpers

use async_trait::async_trait;
use regex::Regex;
use regguard_core::{
    Context, Error, ModuleConfig, ModuleResult, Requirements, Result, Severity, Violation,
};
use std::sync::Arc;
use tracing::warn;

/// Trait for all policy modules.
///
/// A module inspects content in isolation: it may read its own configuration
/// but never state owned by other modules or by the engine. Built-in modules
/// convert their own heuristic failures into an `ANALYSIS_ERROR` result; an
/// `Err` returned from `evaluate` is treated by the engine as a module defect.
#[async_trait]
pub trait PolicyModule: Send + Sync {
    /// Catalog name of the module
    fn name(&self) -> &str;

    /// Evaluate content against this module's policy
    async fn evaluate(&self, content: &str, context: &Context) -> Result<ModuleResult>;

    /// Describe the configured thresholds and the regulatory domain
    fn describe(&self) -> Result<Requirements>;

    /// Build a fresh instance of the same module from new options
    fn reconfigured(&self, config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>>;
}

/// Convert a failed analysis into an `ANALYSIS_ERROR` result
pub fn contain_analysis(module: &str, outcome: Result<ModuleResult>) -> ModuleResult {
    outcome.unwrap_or_else(|e| {
        warn!(module_name = module, error = %e, "analysis failed");
        ModuleResult::analysis_error(&e)
    })
}

/// Compile a built-in pattern, reporting failures as configuration errors
pub(crate) fn compile_pattern(label: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::config(format!("Failed to compile {} regex: {}", label, e)))
}

/// Accumulates violations and recommendations during one analysis
#[derive(Debug, Default)]
pub(crate) struct Findings {
    violations: Vec<Violation>,
    recommendations: Vec<String>,
}

impl Findings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn flag(&mut self, kind: &str, message: impl Into<String>, severity: Severity) {
        self.violations.push(Violation::new(kind, message, severity));
    }

    pub(crate) fn recommend(&mut self, recommendation: &str) {
        if !self.recommendations.iter().any(|r| r == recommendation) {
            self.recommendations.push(recommendation.to_string());
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub(crate) fn finish(self, threshold: Severity) -> ModuleResult {
        ModuleResult::from_findings(self.violations, self.recommendations, threshold)
    }
}

/// Read a boolean flag from the evaluation context
pub(crate) fn context_flag(context: &Context, key: &str) -> bool {
    context
        .get(key)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// Read a string value from the evaluation context
pub(crate) fn context_str<'a>(context: &'a Context, key: &str) -> Option<&'a str> {
    context.get(key).and_then(serde_json::Value::as_str)
}

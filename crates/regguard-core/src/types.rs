//! Core types for RegGuard

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Caller-supplied evaluation context, passed to every module unchanged
pub type Context = Map<String, Value>;

/// Violation type reported when a module's own heuristic fails
pub const ANALYSIS_ERROR: &str = "ANALYSIS_ERROR";

/// Violation type reported when a module fails past its own boundary
pub const MODULE_ERROR: &str = "MODULE_ERROR";

/// Ordinal risk level of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, lowest first
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Upper-case label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One flagged issue found by a policy module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation type, e.g. `HARDCODED_SECRET`
    #[serde(rename = "type")]
    pub kind: String,

    /// Human-readable description
    pub message: String,

    /// Risk level
    pub severity: Severity,
}

impl Violation {
    /// Create a new violation
    pub fn new(kind: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            severity,
        }
    }

    /// Violation for a heuristic failure inside a module
    pub fn analysis_error(message: impl Into<String>) -> Self {
        Self::new(ANALYSIS_ERROR, message, Severity::Medium)
    }

    /// Violation for a module failure caught by the engine
    pub fn module_error(message: impl Into<String>) -> Self {
        Self::new(MODULE_ERROR, message, Severity::High)
    }

    /// Whether this violation is at or above the given threshold
    pub fn is_at_least(&self, threshold: Severity) -> bool {
        self.severity >= threshold
    }
}

/// Outcome of one module's evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    /// Whether the module considers the content compliant
    pub compliant: bool,

    /// Violations in the order the module produced them
    pub violations: Vec<Violation>,

    /// Recommendations in the order the module produced them
    pub recommendations: Vec<String>,

    /// Module-specific findings
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ModuleResult {
    /// A clean result with no findings
    pub fn pass() -> Self {
        Self {
            compliant: true,
            violations: Vec::new(),
            recommendations: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Build a result whose compliance flag is derived from a hard threshold:
    /// non-compliant iff some violation is at or above `threshold`.
    pub fn from_findings(
        violations: Vec<Violation>,
        recommendations: Vec<String>,
        threshold: Severity,
    ) -> Self {
        let compliant = !violations.iter().any(|v| v.is_at_least(threshold));
        Self {
            compliant,
            violations,
            recommendations,
            metadata: Map::new(),
        }
    }

    /// Result carrying a single `ANALYSIS_ERROR` violation
    pub fn analysis_error(error: &Error) -> Self {
        Self::failed(Violation::analysis_error(error.to_string()))
    }

    /// Result carrying a single `MODULE_ERROR` violation
    pub fn module_error(message: impl Into<String>) -> Self {
        Self::failed(Violation::module_error(message))
    }

    fn failed(violation: Violation) -> Self {
        Self {
            compliant: false,
            violations: vec![violation],
            recommendations: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Highest severity among the violations
    pub fn max_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}

/// Static description of a module's configuration and regulatory domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    /// Module catalog name
    pub module: String,

    /// Regulatory domain the module models
    pub domain: String,

    /// Regulation or framework the heuristics are loosely modeled on
    pub regulation: String,

    /// What the module checks
    pub description: String,

    /// Lowest severity that makes the module report non-compliance
    pub non_compliant_at: Severity,

    /// Configured thresholds and options
    pub parameters: Value,
}

/// Requirements of one module, or a placeholder when `describe` failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequirementsEntry {
    Described(Requirements),
    Unavailable { error: String },
}

impl RequirementsEntry {
    /// The requirements, if the module described itself
    pub fn requirements(&self) -> Option<&Requirements> {
        match self {
            Self::Described(req) => Some(req),
            Self::Unavailable { .. } => None,
        }
    }

    /// Whether this is an error placeholder
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Module-specific configuration options.
///
/// Each module parses the keys it recognizes into its own settings struct;
/// unrecognized keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleConfig(Map<String, Value>);

impl ModuleConfig {
    /// Empty configuration (all defaults)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a raw option value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether no options are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the options into a typed settings struct
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| Error::config(format!("invalid module options: {}", e)))
    }
}

impl From<Map<String, Value>> for ModuleConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::ALL.iter().max(), Some(&Severity::Critical));
    }

    #[test]
    fn test_severity_serializes_upper_case() {
        assert_eq!(serde_json::to_value(Severity::Critical).unwrap(), json!("CRITICAL"));
        let parsed: Severity = serde_json::from_value(json!("LOW")).unwrap();
        assert_eq!(parsed, Severity::Low);
    }

    #[test]
    fn test_violation_serializes_type_field() {
        let v = Violation::new("PII_EMAIL", "email address found", Severity::High);
        let value = serde_json::to_value(&v).unwrap();
        assert_eq!(value["type"], "PII_EMAIL");
        assert_eq!(value["severity"], "HIGH");
    }

    #[test]
    fn test_from_findings_threshold() {
        let findings = vec![Violation::new("A", "a", Severity::High)];

        let strict = ModuleResult::from_findings(findings.clone(), vec![], Severity::High);
        assert!(!strict.compliant);

        let lenient = ModuleResult::from_findings(findings, vec![], Severity::Critical);
        assert!(lenient.compliant);
        assert_eq!(lenient.max_severity(), Some(Severity::High));
    }

    #[test]
    fn test_error_results() {
        let analysis = ModuleResult::analysis_error(&Error::analysis("bad pattern"));
        assert!(!analysis.compliant);
        assert_eq!(analysis.violations.len(), 1);
        assert_eq!(analysis.violations[0].kind, ANALYSIS_ERROR);
        assert_eq!(analysis.violations[0].severity, Severity::Medium);

        let module = ModuleResult::module_error("boom");
        assert_eq!(module.violations[0].kind, MODULE_ERROR);
        assert_eq!(module.violations[0].severity, Severity::High);
    }

    #[derive(Debug, Deserialize, Default)]
    #[serde(default)]
    struct Settings {
        max_depth: usize,
    }

    #[test]
    fn test_module_config_ignores_unknown_keys() {
        let config = ModuleConfig::new()
            .with("max_depth", 4)
            .with("from_the_future", "ignored");
        let settings: Settings = config.parse().unwrap();
        assert_eq!(settings.max_depth, 4);
    }

    #[test]
    fn test_module_config_rejects_wrong_type() {
        let config = ModuleConfig::new().with("max_depth", "deep");
        assert!(config.parse::<Settings>().is_err());
    }

    #[test]
    fn test_requirements_entry_placeholder() {
        let entry = RequirementsEntry::Unavailable {
            error: "describe failed".to_string(),
        };
        assert!(entry.is_unavailable());
        assert_eq!(serde_json::to_value(&entry).unwrap(), json!({"error": "describe failed"}));
    }
}

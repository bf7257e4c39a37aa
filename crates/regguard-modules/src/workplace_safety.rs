//! Workplace safety module (OSHA-style code hygiene)

use crate::module::{compile_pattern, contain_analysis, Findings, PolicyModule};
use async_trait::async_trait;
use regex::Regex;
use regguard_core::{Context, ModuleConfig, ModuleResult, Requirements, Result, Severity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NON_COMPLIANT_AT: Severity = Severity::High;

/// Options recognized by the workplace safety module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkplaceSafetySettings {
    /// Longest line, in characters, before it counts as a hazard
    pub max_line_length: usize,

    /// Longest artifact, in lines
    pub max_file_lines: usize,

    /// TODO/FIXME/HACK markers tolerated
    pub max_todo_markers: usize,
}

impl Default for WorkplaceSafetySettings {
    fn default() -> Self {
        Self {
            max_line_length: 120,
            max_file_lines: 1000,
            max_todo_markers: 5,
        }
    }
}

/// Code-quality hazards framed as workplace safety
pub struct WorkplaceSafetyModule {
    settings: WorkplaceSafetySettings,
    credential: Regex,
    dynamic_eval: Regex,
    tls_disabled: Regex,
    marker: Regex,
}

impl WorkplaceSafetyModule {
    /// Catalog name
    pub const NAME: &'static str = "workplace_safety";

    /// Create a module with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(WorkplaceSafetySettings::default())
    }

    /// Create a module from configuration options
    pub fn from_config(config: &ModuleConfig) -> Result<Self> {
        Self::with_settings(config.parse()?)
    }

    /// Create a module from typed settings
    pub fn with_settings(settings: WorkplaceSafetySettings) -> Result<Self> {
        Ok(Self {
            settings,
            credential: compile_pattern(
                "credential",
                r#"(?i)\b(?:password|passwd|secret|api[_-]?key|access[_-]?token|private[_-]?key)\b\s*[:=]\s*["'][^"']{4,}["']"#,
            )?,
            dynamic_eval: compile_pattern("dynamic eval", r"\beval\s*\(")?,
            tls_disabled: compile_pattern(
                "tls verification",
                r"(?i)(?:verify\s*=\s*false|rejectUnauthorized\s*:\s*false|danger_accept_invalid_certs\s*\(\s*true\s*\)|InsecureSkipVerify\s*:\s*true)",
            )?,
            marker: compile_pattern("marker", r"\b(?:TODO|FIXME|HACK|XXX)\b")?,
        })
    }

    /// Current settings
    pub fn settings(&self) -> &WorkplaceSafetySettings {
        &self.settings
    }

    fn analyze(&self, content: &str, _context: &Context) -> Result<ModuleResult> {
        let mut findings = Findings::new();

        let credentials = self.credential.find_iter(content).count();
        if credentials > 0 {
            findings.flag(
                "HARDCODED_CREDENTIAL",
                format!("{} hardcoded credential(s) found", credentials),
                Severity::Critical,
            );
            findings.recommend("Move secrets into a secret manager or environment variables");
        }

        let evals = self.dynamic_eval.find_iter(content).count();
        if evals > 0 {
            findings.flag(
                "DYNAMIC_EVAL",
                format!("{} dynamic eval call(s) found", evals),
                Severity::High,
            );
            findings.recommend("Replace eval with explicit parsing or dispatch");
        }

        if self.tls_disabled.is_match(content) {
            findings.flag(
                "TLS_VERIFICATION_DISABLED",
                "Certificate verification is switched off",
                Severity::High,
            );
            findings.recommend("Keep TLS certificate verification enabled");
        }

        let line_count = content.lines().count();
        let long_lines = content
            .lines()
            .filter(|l| l.chars().count() > self.settings.max_line_length)
            .count();
        if long_lines > 0 {
            findings.flag(
                "LONG_LINES",
                format!(
                    "{} line(s) exceed {} characters",
                    long_lines, self.settings.max_line_length
                ),
                Severity::Low,
            );
            findings.recommend("Wrap long lines to keep code reviewable");
        }

        if line_count > self.settings.max_file_lines {
            findings.flag(
                "OVERSIZED_FILE",
                format!(
                    "{} lines (limit {})",
                    line_count, self.settings.max_file_lines
                ),
                Severity::Medium,
            );
            findings.recommend("Split large files into focused modules");
        }

        let markers = self.marker.find_iter(content).count();
        if markers > self.settings.max_todo_markers {
            findings.flag(
                "UNRESOLVED_MARKERS",
                format!(
                    "{} TODO/FIXME/HACK markers (limit {})",
                    markers, self.settings.max_todo_markers
                ),
                Severity::Low,
            );
            findings.recommend("Track outstanding work in the issue tracker");
        }

        Ok(findings
            .finish(NON_COMPLIANT_AT)
            .with_metadata("line_count", line_count)
            .with_metadata("long_lines", long_lines)
            .with_metadata("todo_markers", markers)
            .with_metadata("hardcoded_credentials", credentials))
    }
}

#[async_trait]
impl PolicyModule for WorkplaceSafetyModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        Ok(contain_analysis(Self::NAME, self.analyze(content, context)))
    }

    fn describe(&self) -> Result<Requirements> {
        Ok(Requirements {
            module: Self::NAME.to_string(),
            domain: "workplace safety / code quality".to_string(),
            regulation: "OSHA general duty clause (code hygiene analogue)".to_string(),
            description: "Flags hardcoded credentials, eval, disabled TLS checks and unmaintainable code"
                .to_string(),
            non_compliant_at: NON_COMPLIANT_AT,
            parameters: serde_json::to_value(&self.settings)?,
        })
    }

    fn reconfigured(&self, config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        Ok(Arc::new(Self::from_config(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hardcoded_password() {
        let module = WorkplaceSafetyModule::new().unwrap();
        let result = module
            .evaluate(r#"let password = "hunter22";"#, &Context::new())
            .await
            .unwrap();

        assert!(!result.compliant);
        assert_eq!(result.violations[0].kind, "HARDCODED_CREDENTIAL");
        assert_eq!(result.violations[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_eval_and_tls() {
        let module = WorkplaceSafetyModule::new().unwrap();
        let code = "eval(userInput);\nrequests.get(url, verify=False)\n";

        let result = module.evaluate(code, &Context::new()).await.unwrap();
        let kinds: Vec<_> = result.violations.iter().map(|v| v.kind.as_str()).collect();
        assert_eq!(kinds, vec!["DYNAMIC_EVAL", "TLS_VERIFICATION_DISABLED"]);
        assert!(!result.compliant);
    }

    #[tokio::test]
    async fn test_long_lines_are_low_risk() {
        let module = WorkplaceSafetyModule::new().unwrap();
        let line = "x".repeat(200);

        let result = module.evaluate(&line, &Context::new()).await.unwrap();
        assert!(result.compliant);
        assert_eq!(result.violations[0].kind, "LONG_LINES");
        assert_eq!(result.metadata["long_lines"], 1);
    }

    #[tokio::test]
    async fn test_marker_limit_configurable() {
        let code = "// TODO one\n// FIXME two\n";

        let strict = WorkplaceSafetyModule::from_config(
            &ModuleConfig::new().with("max_todo_markers", 1),
        )
        .unwrap();
        let result = strict.evaluate(code, &Context::new()).await.unwrap();
        assert_eq!(result.violations[0].kind, "UNRESOLVED_MARKERS");

        let lenient = WorkplaceSafetyModule::new().unwrap();
        let result = lenient.evaluate(code, &Context::new()).await.unwrap();
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_unknown_options_ignored() {
        let config = ModuleConfig::new()
            .with("max_line_length", 80)
            .with("hard_hat_required", true);
        let module = WorkplaceSafetyModule::from_config(&config).unwrap();
        assert_eq!(module.settings().max_line_length, 80);
        assert_eq!(module.settings().max_file_lines, 1000);
    }
}

//! Privileged communication module
//!
//! Flags attorney-client and work-product material that ended up in an
//! artifact, and escalates when the context says the artifact is headed
//! outside the organisation.

use crate::lexicon::Lexicon;
use crate::module::{compile_pattern, context_str, contain_analysis, Findings, PolicyModule};
use async_trait::async_trait;
use regex::Regex;
use regguard_core::{Context, ModuleConfig, ModuleResult, Requirements, Result, Severity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NON_COMPLIANT_AT: Severity = Severity::High;

const PRIVILEGE_MARKERS: &[&str] = &[
    "attorney-client privilege",
    "attorney client privilege",
    "attorney-client privileged",
    "privileged and confidential",
    "privileged & confidential",
    "attorney work product",
    "work product doctrine",
    "prepared at the direction of counsel",
    "legal advice",
    "subject to legal hold",
];

/// Options recognized by the privilege module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeSettings {
    /// Email domains belonging to outside or in-house counsel
    pub counsel_domains: Vec<String>,

    /// Extra privilege markers appended to the built-in list
    pub additional_markers: Vec<String>,

    /// Context `destination` values that count as leaving the organisation
    pub external_destinations: Vec<String>,
}

impl Default for PrivilegeSettings {
    fn default() -> Self {
        Self {
            counsel_domains: Vec::new(),
            additional_markers: Vec::new(),
            external_destinations: vec![
                "public".to_string(),
                "external".to_string(),
                "open-source".to_string(),
            ],
        }
    }
}

/// Privileged communication heuristics
pub struct PrivilegeModule {
    settings: PrivilegeSettings,
    markers: Lexicon,
    email_domain: Regex,
}

impl PrivilegeModule {
    /// Catalog name
    pub const NAME: &'static str = "privilege";

    /// Create a module with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(PrivilegeSettings::default())
    }

    /// Create a module from configuration options
    pub fn from_config(config: &ModuleConfig) -> Result<Self> {
        Self::with_settings(config.parse()?)
    }

    /// Create a module from typed settings
    pub fn with_settings(settings: PrivilegeSettings) -> Result<Self> {
        let markers = PRIVILEGE_MARKERS
            .iter()
            .map(|m| m.to_string())
            .chain(settings.additional_markers.iter().cloned());

        Ok(Self {
            markers: Lexicon::new(markers)?,
            email_domain: compile_pattern(
                "counsel email",
                r"\b[A-Za-z0-9._%+-]+@([A-Za-z0-9.-]+\.[A-Za-z]{2,})\b",
            )?,
            settings,
        })
    }

    /// Current settings
    pub fn settings(&self) -> &PrivilegeSettings {
        &self.settings
    }

    fn counsel_addresses(&self, content: &str) -> usize {
        if self.settings.counsel_domains.is_empty() {
            return 0;
        }

        self.email_domain
            .captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .filter(|domain| {
                self.settings
                    .counsel_domains
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(domain.as_str()))
            })
            .count()
    }

    fn analyze(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        let mut findings = Findings::new();

        let markers = self.markers.matches(content);
        if !markers.is_empty() {
            findings.flag(
                "PRIVILEGE_MARKER",
                format!("Privileged material markers: {}", markers.join(", ")),
                Severity::High,
            );
            findings.recommend("Remove privileged communications from shared artifacts");
        }

        let counsel = self.counsel_addresses(content);
        if counsel > 0 {
            findings.flag(
                "COUNSEL_COMMUNICATION",
                format!("{} counsel address(es) referenced", counsel),
                Severity::Medium,
            );
            findings.recommend("Confirm with legal before sharing counsel correspondence");
        }

        let destination = context_str(context, "destination");
        let external = destination.map_or(false, |d| {
            self.settings
                .external_destinations
                .iter()
                .any(|e| e.eq_ignore_ascii_case(d))
        });
        if external && (!markers.is_empty() || counsel > 0) {
            findings.flag(
                "PRIVILEGE_WAIVER_RISK",
                format!(
                    "Privileged material bound for '{}' may waive privilege",
                    destination.unwrap_or_default()
                ),
                Severity::Critical,
            );
            findings.recommend("Block external distribution until legal review completes");
        }

        let marker_count = markers.len();
        Ok(findings
            .finish(NON_COMPLIANT_AT)
            .with_metadata("privilege_markers", marker_count)
            .with_metadata("counsel_addresses", counsel)
            .with_metadata("external_destination", external))
    }
}

#[async_trait]
impl PolicyModule for PrivilegeModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        Ok(contain_analysis(Self::NAME, self.analyze(content, context)))
    }

    fn describe(&self) -> Result<Requirements> {
        Ok(Requirements {
            module: Self::NAME.to_string(),
            domain: "privileged communications".to_string(),
            regulation: "Attorney-client privilege and work-product doctrine".to_string(),
            description: "Flags privilege markers and counsel correspondence, escalating on external release"
                .to_string(),
            non_compliant_at: NON_COMPLIANT_AT,
            parameters: serde_json::to_value(&self.settings)?,
        })
    }

    fn reconfigured(&self, config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        Ok(Arc::new(Self::from_config(config)?))
    }
}

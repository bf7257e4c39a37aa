//! Trade sanctions screening module
//!
//! Screens content for embargoed jurisdictions, listed entities and export
//! control references, and checks the recipient country declared in the
//! evaluation context. Only CRITICAL findings make the module non-compliant.

use crate::lexicon::Lexicon;
use crate::module::{context_str, contain_analysis, Findings, PolicyModule};
use async_trait::async_trait;
use regguard_core::{Context, ModuleConfig, ModuleResult, Requirements, Result, Severity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NON_COMPLIANT_AT: Severity = Severity::Critical;

const EXPORT_CONTROL_TERMS: &[&str] = &[
    "itar",
    "ear99",
    "eccn",
    "dual-use",
    "export controlled",
    "export-controlled",
];

/// Options recognized by the sanctions module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanctionsSettings {
    /// Embargoed jurisdiction names; replaces the built-in list
    pub embargoed_jurisdictions: Vec<String>,

    /// ISO 3166 alpha-2 codes of embargoed jurisdictions
    pub embargoed_country_codes: Vec<String>,

    /// Screened entity names
    pub listed_entities: Vec<String>,

    /// Report export control references
    pub screen_export_controls: bool,
}

impl Default for SanctionsSettings {
    fn default() -> Self {
        Self {
            embargoed_jurisdictions: ["cuba", "iran", "north korea", "dprk", "syria", "crimea"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            embargoed_country_codes: ["CU", "IR", "KP", "SY"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            listed_entities: [
                "banco nacional de cuba",
                "korea mining development trading corporation",
                "islamic republic of iran shipping lines",
                "mahan air",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            screen_export_controls: true,
        }
    }
}

/// Trade sanctions heuristics
pub struct SanctionsModule {
    settings: SanctionsSettings,
    jurisdictions: Lexicon,
    entities: Lexicon,
    export_terms: Lexicon,
}

impl SanctionsModule {
    /// Catalog name
    pub const NAME: &'static str = "sanctions";

    /// Create a module with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(SanctionsSettings::default())
    }

    /// Create a module from configuration options
    pub fn from_config(config: &ModuleConfig) -> Result<Self> {
        Self::with_settings(config.parse()?)
    }

    /// Create a module from typed settings
    pub fn with_settings(settings: SanctionsSettings) -> Result<Self> {
        Ok(Self {
            jurisdictions: Lexicon::new(settings.embargoed_jurisdictions.iter().cloned())?,
            entities: Lexicon::new(settings.listed_entities.iter().cloned())?,
            export_terms: Lexicon::new(EXPORT_CONTROL_TERMS.iter().copied())?,
            settings,
        })
    }

    /// Current settings
    pub fn settings(&self) -> &SanctionsSettings {
        &self.settings
    }

    fn analyze(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        let mut findings = Findings::new();

        let jurisdictions = self.jurisdictions.matches(content);
        if !jurisdictions.is_empty() {
            findings.flag(
                "SANCTIONED_JURISDICTION",
                format!("Embargoed jurisdictions referenced: {}", jurisdictions.join(", ")),
                Severity::Critical,
            );
            findings.recommend("Escalate to trade compliance before any transaction proceeds");
        }

        let entities = self.entities.matches(content);
        if !entities.is_empty() {
            findings.flag(
                "LISTED_ENTITY",
                format!("Screened entities referenced: {}", entities.join(", ")),
                Severity::Critical,
            );
            findings.recommend("Escalate to trade compliance before any transaction proceeds");
        }

        let recipient = context_str(context, "recipient_country");
        if let Some(code) = recipient {
            let embargoed = self
                .settings
                .embargoed_country_codes
                .iter()
                .any(|c| c.eq_ignore_ascii_case(code));
            if embargoed {
                findings.flag(
                    "SANCTIONED_RECIPIENT",
                    format!("Recipient country '{}' is under embargo", code),
                    Severity::Critical,
                );
                findings.recommend("Do not ship to embargoed destinations");
            }
        }

        let export_terms = if self.settings.screen_export_controls {
            self.export_terms.matches(content)
        } else {
            Vec::new()
        };
        if !export_terms.is_empty() {
            findings.flag(
                "EXPORT_CONTROL_REFERENCE",
                format!("Export control references: {}", export_terms.join(", ")),
                Severity::Medium,
            );
            findings.recommend("Confirm export classification before distribution");
        }

        let (jurisdiction_hits, entity_hits, export_hits) =
            (jurisdictions.len(), entities.len(), export_terms.len());
        Ok(findings
            .finish(NON_COMPLIANT_AT)
            .with_metadata("jurisdiction_hits", jurisdiction_hits)
            .with_metadata("entity_hits", entity_hits)
            .with_metadata("export_control_hits", export_hits))
    }
}

#[async_trait]
impl PolicyModule for SanctionsModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        Ok(contain_analysis(Self::NAME, self.analyze(content, context)))
    }

    fn describe(&self) -> Result<Requirements> {
        Ok(Requirements {
            module: Self::NAME.to_string(),
            domain: "trade sanctions".to_string(),
            regulation: "OFAC sanctions programs and EAR/ITAR export controls".to_string(),
            description: "Screens for embargoed jurisdictions, listed entities and export control terms"
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
    use serde_json::json;

    #[tokio::test]
    async fn test_jurisdiction_is_critical() {
        let module = SanctionsModule::new().unwrap();
        let result = module
            .evaluate("Ship the order to Havana, Cuba", &Context::new())
            .await
            .unwrap();

        assert!(!result.compliant);
        assert_eq!(result.violations[0].kind, "SANCTIONED_JURISDICTION");
    }

    #[tokio::test]
    async fn test_word_boundaries() {
        let module = SanctionsModule::new().unwrap();
        let result = module
            .evaluate("Flights to Tirana via Syriac studies", &Context::new())
            .await
            .unwrap();

        assert!(result.compliant);
        assert!(result.violations.is_empty());
    }

    #[tokio::test]
    async fn test_export_control_is_not_blocking() {
        let module = SanctionsModule::new().unwrap();
        let result = module
            .evaluate("This library is classified EAR99", &Context::new())
            .await
            .unwrap();

        assert!(result.compliant);
        assert_eq!(result.violations[0].severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_recipient_country_context() {
        let module = SanctionsModule::new().unwrap();
        let context = json!({"recipient_country": "kp"}).as_object().cloned().unwrap();

        let result = module.evaluate("invoice", &context).await.unwrap();
        assert!(!result.compliant);
        assert_eq!(result.violations[0].kind, "SANCTIONED_RECIPIENT");
    }

    #[tokio::test]
    async fn test_jurisdiction_override_replaces_defaults() {
        let config = ModuleConfig::new().with("embargoed_jurisdictions", json!(["atlantis"]));
        let module = SanctionsModule::from_config(&config).unwrap();

        let cuba = module.evaluate("Cuba", &Context::new()).await.unwrap();
        assert!(cuba.compliant);

        let atlantis = module.evaluate("Atlantis", &Context::new()).await.unwrap();
        assert!(!atlantis.compliant);
    }
}

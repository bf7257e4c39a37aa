//! Health data module (HIPAA-style heuristics)
//!
//! Looks for protected health information in artifacts: medical record
//! numbers, diagnosis codes, health plan identifiers, and clinical vocabulary
//! appearing next to personal identifiers. Only CRITICAL findings make the
//! module report non-compliance.

use crate::lexicon::Lexicon;
use crate::module::{compile_pattern, context_flag, contain_analysis, Findings, PolicyModule};
use async_trait::async_trait;
use regex::Regex;
use regguard_core::{Context, ModuleConfig, ModuleResult, Requirements, Result, Severity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NON_COMPLIANT_AT: Severity = Severity::Critical;

const CLINICAL_TERMS: &[&str] = &[
    "patient",
    "diagnosis",
    "diagnosed",
    "prescription",
    "prescribed",
    "treatment plan",
    "lab result",
    "lab results",
    "medical history",
    "blood type",
    "hiv",
    "oncology",
    "chemotherapy",
    "psychiatric",
    "insulin",
];

/// Options recognized by the health data module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthDataSettings {
    /// Extra clinical terms appended to the built-in vocabulary
    pub additional_terms: Vec<String>,

    /// Skip identifier/clinical-term pairing when the context declares
    /// `deidentified: true`
    pub honor_deidentified_context: bool,
}

impl Default for HealthDataSettings {
    fn default() -> Self {
        Self {
            additional_terms: Vec::new(),
            honor_deidentified_context: true,
        }
    }
}

/// Personal health information heuristics
pub struct HealthDataModule {
    settings: HealthDataSettings,
    clinical_terms: Lexicon,
    medical_record: Regex,
    diagnosis_code: Regex,
    health_plan_id: Regex,
    personal_identifier: Regex,
    plain_http: Regex,
}

impl HealthDataModule {
    /// Catalog name
    pub const NAME: &'static str = "health_data";

    /// Create a module with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(HealthDataSettings::default())
    }

    /// Create a module from configuration options
    pub fn from_config(config: &ModuleConfig) -> Result<Self> {
        Self::with_settings(config.parse()?)
    }

    /// Create a module from typed settings
    pub fn with_settings(settings: HealthDataSettings) -> Result<Self> {
        let terms = CLINICAL_TERMS
            .iter()
            .map(|t| t.to_string())
            .chain(settings.additional_terms.iter().cloned());

        Ok(Self {
            clinical_terms: Lexicon::new(terms)?,
            medical_record: compile_pattern(
                "medical record number",
                r"(?i)\b(?:MRN|medical\s+record(?:\s+number)?)\s*[:#]?\s*\d{6,10}\b",
            )?,
            diagnosis_code: compile_pattern(
                "diagnosis code",
                r"\b[A-TV-Z][0-9]{2}\.[0-9A-Z]{1,4}\b",
            )?,
            health_plan_id: compile_pattern(
                "health plan id",
                r"(?i)\b(?:member|subscriber|health\s+plan)\s*(?:id|number|no\.?|#)\s*[:#]?\s*[A-Z0-9]{6,}\b",
            )?,
            personal_identifier: compile_pattern(
                "personal identifier",
                r"(?i)(?:\b\d{3}-\d{2}-\d{4}\b|\b(?:dob|date\s+of\s+birth)\b|\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b)",
            )?,
            plain_http: compile_pattern("plain http", r"\bhttp://[^\s\x22']+")?,
            settings,
        })
    }

    /// Current settings
    pub fn settings(&self) -> &HealthDataSettings {
        &self.settings
    }

    fn analyze(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        let mut findings = Findings::new();

        let records = self.medical_record.find_iter(content).count();
        if records > 0 {
            findings.flag(
                "MEDICAL_RECORD_NUMBER",
                format!("{} medical record number(s) found", records),
                Severity::Critical,
            );
            findings.recommend("Remove personal data from source artifacts");
        }

        let diagnoses = self.diagnosis_code.find_iter(content).count();
        if diagnoses > 0 {
            findings.flag(
                "DIAGNOSIS_CODE",
                format!("{} ICD-10 style diagnosis code(s) found", diagnoses),
                Severity::High,
            );
            findings.recommend("Replace real diagnosis codes with synthetic fixtures");
        }

        let plan_ids = self.health_plan_id.find_iter(content).count();
        if plan_ids > 0 {
            findings.flag(
                "HEALTH_PLAN_ID",
                format!("{} health plan identifier(s) found", plan_ids),
                Severity::High,
            );
            findings.recommend("Remove personal data from source artifacts");
        }

        let terms = self.clinical_terms.matches(content);
        let deidentified =
            self.settings.honor_deidentified_context && context_flag(context, "deidentified");

        if !terms.is_empty() {
            if !deidentified && self.personal_identifier.is_match(content) {
                findings.flag(
                    "PHI_EXPOSURE",
                    format!(
                        "Clinical terms ({}) appear alongside personal identifiers",
                        terms.join(", ")
                    ),
                    Severity::Critical,
                );
                findings.recommend("De-identify records before they leave the clinical system");
            } else {
                findings.flag(
                    "HEALTH_TERMS",
                    format!("Clinical vocabulary present: {}", terms.join(", ")),
                    Severity::Low,
                );
            }

            if self.plain_http.is_match(content) {
                findings.flag(
                    "UNENCRYPTED_PHI_TRANSMISSION",
                    "Health-related content references plain HTTP endpoints",
                    Severity::High,
                );
                findings.recommend("Transmit health data only over TLS");
            }
        }

        let term_count = terms.len();
        Ok(findings
            .finish(NON_COMPLIANT_AT)
            .with_metadata("medical_record_numbers", records)
            .with_metadata("diagnosis_codes", diagnoses)
            .with_metadata("health_plan_ids", plan_ids)
            .with_metadata("clinical_terms", term_count)
            .with_metadata("deidentified", deidentified))
    }
}

#[async_trait]
impl PolicyModule for HealthDataModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        Ok(contain_analysis(Self::NAME, self.analyze(content, context)))
    }

    fn describe(&self) -> Result<Requirements> {
        Ok(Requirements {
            module: Self::NAME.to_string(),
            domain: "personal health information".to_string(),
            regulation: "HIPAA Privacy and Security Rules".to_string(),
            description:
                "Detects medical record numbers, diagnosis codes, plan identifiers and PHI pairings"
                    .to_string(),
            non_compliant_at: NON_COMPLIANT_AT,
            parameters: serde_json::json!({
                "additional_terms": self.settings.additional_terms,
                "honor_deidentified_context": self.settings.honor_deidentified_context,
                "clinical_vocabulary_size": self.clinical_terms.terms().len(),
            }),
        })
    }

    fn reconfigured(&self, config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        Ok(Arc::new(Self::from_config(config)?))
    }
}

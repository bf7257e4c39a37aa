//! Personal data protection module (GDPR-style heuristics)
//!
//! Detects personal data in artifacts and checks whether processing consent
//! was declared in the evaluation context. Operators can extend detection with
//! override patterns; those are compiled per evaluation, so a malformed
//! override surfaces as an `ANALYSIS_ERROR` result instead of a startup error.

use crate::module::{
    compile_pattern, context_flag, contain_analysis, Findings, PolicyModule,
};
use async_trait::async_trait;
use regex::Regex;
use regguard_core::{
    Context, Error, ModuleConfig, ModuleResult, Requirements, Result, Severity,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NON_COMPLIANT_AT: Severity = Severity::High;

/// An operator-supplied detection pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPattern {
    /// Violation type reported on match
    pub name: String,

    /// Regular expression
    pub pattern: String,

    /// Severity reported on match
    #[serde(default = "default_custom_severity")]
    pub severity: Severity,
}

fn default_custom_severity() -> Severity {
    Severity::High
}

/// Options recognized by the data protection module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataProtectionSettings {
    /// Flag personal data when the context does not declare `consent: true`
    pub require_consent: bool,

    /// Email domains treated as placeholders (e.g. `example.com`)
    pub ignored_email_domains: Vec<String>,

    /// Additional detection patterns
    pub custom_patterns: Vec<CustomPattern>,
}

/// Personal data heuristics
pub struct DataProtectionModule {
    settings: DataProtectionSettings,
    email: Regex,
    phone: Regex,
    ip_address: Regex,
    card_candidate: Regex,
    national_id: Regex,
}

impl DataProtectionModule {
    /// Catalog name
    pub const NAME: &'static str = "data_protection";

    /// Create a module with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(DataProtectionSettings::default())
    }

    /// Create a module from configuration options
    pub fn from_config(config: &ModuleConfig) -> Result<Self> {
        Self::with_settings(config.parse()?)
    }

    /// Create a module from typed settings
    pub fn with_settings(settings: DataProtectionSettings) -> Result<Self> {
        Ok(Self {
            settings,
            email: compile_pattern(
                "email",
                r"\b[A-Za-z0-9._%+-]+@([A-Za-z0-9.-]+\.[A-Za-z]{2,})\b",
            )?,
            phone: compile_pattern("phone", r"\(?\b\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b")?,
            ip_address: compile_pattern(
                "ip address",
                r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
            )?,
            card_candidate: compile_pattern(
                "payment card",
                r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{1,7}\b",
            )?,
            national_id: compile_pattern("national id", r"\b\d{3}-\d{2}-\d{4}\b")?,
        })
    }

    /// Current settings
    pub fn settings(&self) -> &DataProtectionSettings {
        &self.settings
    }

    fn count_emails(&self, content: &str) -> usize {
        self.email
            .captures_iter(content)
            .filter(|caps| {
                let domain = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                !self
                    .settings
                    .ignored_email_domains
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(domain))
            })
            .count()
    }

    fn count_cards(&self, content: &str) -> usize {
        self.card_candidate
            .find_iter(content)
            .filter(|m| luhn_valid(m.as_str()))
            .count()
    }

    fn count_ips(&self, content: &str) -> usize {
        self.ip_address
            .find_iter(content)
            .filter(|m| !matches!(m.as_str(), "127.0.0.1" | "0.0.0.0"))
            .count()
    }

    fn analyze(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        let mut findings = Findings::new();

        let emails = self.count_emails(content);
        if emails > 0 {
            findings.flag(
                "PERSONAL_EMAIL",
                format!("{} email address(es) found", emails),
                Severity::High,
            );
            findings.recommend("Remove personal data from source artifacts");
        }

        let phones = self.phone.find_iter(content).count();
        if phones > 0 {
            findings.flag(
                "PHONE_NUMBER",
                format!("{} phone number(s) found", phones),
                Severity::Medium,
            );
            findings.recommend("Remove personal data from source artifacts");
        }

        let ips = self.count_ips(content);
        if ips > 0 {
            findings.flag(
                "IP_ADDRESS",
                format!("{} IP address(es) found", ips),
                Severity::Low,
            );
            findings.recommend("Treat IP addresses as personal data and minimise retention");
        }

        let cards = self.count_cards(content);
        if cards > 0 {
            findings.flag(
                "PAYMENT_CARD",
                format!("{} payment card number(s) found", cards),
                Severity::Critical,
            );
            findings.recommend("Never store full card numbers; tokenize them instead");
        }

        let national_ids = self.national_id.find_iter(content).count();
        if national_ids > 0 {
            findings.flag(
                "NATIONAL_ID",
                format!("{} national identification number(s) found", national_ids),
                Severity::Critical,
            );
            findings.recommend("Remove personal data from source artifacts");
        }

        let mut custom_matches = 0;
        for custom in &self.settings.custom_patterns {
            let regex = Regex::new(&custom.pattern).map_err(|e| {
                Error::analysis(format!("pattern '{}' is invalid: {}", custom.name, e))
            })?;
            let count = regex.find_iter(content).count();
            if count > 0 {
                custom_matches += count;
                findings.flag(
                    &custom.name,
                    format!("{} match(es) for pattern '{}'", count, custom.name),
                    custom.severity,
                );
            }
        }

        let personal_data_found = !findings.is_empty();
        let consent = context_flag(context, "consent");
        if self.settings.require_consent && personal_data_found && !consent {
            findings.flag(
                "MISSING_CONSENT",
                "Personal data processed without a declared lawful basis",
                Severity::High,
            );
            findings.recommend("Record consent or another lawful basis before processing");
        }

        Ok(findings
            .finish(NON_COMPLIANT_AT)
            .with_metadata("emails", emails)
            .with_metadata("phone_numbers", phones)
            .with_metadata("ip_addresses", ips)
            .with_metadata("payment_cards", cards)
            .with_metadata("national_ids", national_ids)
            .with_metadata("custom_matches", custom_matches)
            .with_metadata("consent_declared", consent))
    }
}

/// Luhn checksum over the digits of a candidate card number
fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

#[async_trait]
impl PolicyModule for DataProtectionModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self, content: &str, context: &Context) -> Result<ModuleResult> {
        Ok(contain_analysis(Self::NAME, self.analyze(content, context)))
    }

    fn describe(&self) -> Result<Requirements> {
        Ok(Requirements {
            module: Self::NAME.to_string(),
            domain: "personal data protection".to_string(),
            regulation: "GDPR Articles 5, 6 and 32".to_string(),
            description:
                "Detects emails, phone numbers, IP addresses, card numbers and national ids"
                    .to_string(),
            non_compliant_at: NON_COMPLIANT_AT,
            parameters: serde_json::to_value(&self.settings)?,
        })
    }

    fn reconfigured(&self, config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        Ok(Arc::new(Self::from_config(config)?))
    }
}

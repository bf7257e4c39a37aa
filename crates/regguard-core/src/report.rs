//! Aggregated compliance report types

use crate::types::{ModuleResult, RequirementsEntry, Severity};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Values keyed by module name, kept in registry order
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMap<T> {
    entries: Vec<(String, T)>,
}

/// Per-module evaluation results in registry order
pub type ModuleResults = NamedMap<ModuleResult>;

/// Per-module requirements in registry order
pub type RequirementsMap = NamedMap<RequirementsEntry>;

impl<T> NamedMap<T> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a value; an existing entry with the same name is replaced in place
    pub fn insert(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up a module's value
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Whether a module has an entry
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Module names in order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Iterate `(name, value)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for NamedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(String, T)> for NamedMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl<T: Serialize> Serialize for NamedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Summary statistics derived from a set of module results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Total number of violations across all modules
    pub total_violations: usize,

    /// Violation counts per severity; every severity is present
    pub violations_by_severity: BTreeMap<Severity, usize>,

    /// Deduplicated recommendations in first-appearance order
    pub recommendations: Vec<String>,
}

impl Summary {
    /// Summary of an empty round
    pub fn empty() -> Self {
        Self {
            total_violations: 0,
            violations_by_severity: Severity::ALL.iter().map(|s| (*s, 0)).collect(),
            recommendations: Vec::new(),
        }
    }

    /// Number of violations at the given severity
    pub fn count(&self, severity: Severity) -> usize {
        self.violations_by_severity
            .get(&severity)
            .copied()
            .unwrap_or(0)
    }
}

/// Aggregated outcome of one evaluation round
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    /// AND over every module's compliance flag
    pub overall_compliant: bool,

    /// Results of every enabled module, in registry order
    pub module_results: ModuleResults,

    /// Summary statistics
    pub summary: Summary,
}

impl ComplianceReport {
    /// Names of the modules that reported non-compliance
    pub fn failing_modules(&self) -> Vec<&str> {
        self.module_results
            .iter()
            .filter(|(_, r)| !r.compliant)
            .map(|(n, _)| n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Violation;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut results = ModuleResults::new();
        results.insert("b", ModuleResult::pass());
        results.insert("a", ModuleResult::pass());
        results.insert("b", ModuleResult::module_error("boom"));

        assert_eq!(results.names(), vec!["b", "a"]);
        assert_eq!(results.len(), 2);
        assert!(!results.get("b").unwrap().compliant);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let results: ModuleResults = vec![
            ("zeta".to_string(), ModuleResult::pass()),
            ("alpha".to_string(), ModuleResult::pass()),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&results).unwrap();
        let zeta = json.find("zeta").unwrap();
        let alpha = json.find("alpha").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn test_empty_summary_has_every_severity() {
        let summary = Summary::empty();
        assert_eq!(summary.violations_by_severity.len(), 4);
        assert_eq!(summary.count(Severity::Critical), 0);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["violationsBySeverity"]["CRITICAL"], 0);
        assert_eq!(value["totalViolations"], 0);
    }

    #[test]
    fn test_failing_modules() {
        let mut results = ModuleResults::new();
        results.insert("ok", ModuleResult::pass());
        results.insert(
            "bad",
            ModuleResult::from_findings(
                vec![Violation::new("X", "x", Severity::Critical)],
                vec![],
                Severity::High,
            ),
        );
        let report = ComplianceReport {
            overall_compliant: false,
            module_results: results,
            summary: Summary::empty(),
        };
        assert_eq!(report.failing_modules(), vec!["bad"]);
    }
}

//! Result aggregation
//!
//! Pure functions over a round's module results. Modules are visited in
//! registry order and, within a module, in the order it produced its findings,
//! so recommendation deduplication is deterministic: first occurrence wins.

use regguard_core::{ComplianceReport, ModuleResults, Summary};
use std::collections::HashSet;

/// Summarize a set of module results
pub fn aggregate(results: &ModuleResults) -> Summary {
    let mut summary = Summary::empty();
    let mut seen: HashSet<&str> = HashSet::new();

    for (_, result) in results.iter() {
        for violation in &result.violations {
            summary.total_violations += 1;
            *summary
                .violations_by_severity
                .entry(violation.severity)
                .or_insert(0) += 1;
        }

        for recommendation in &result.recommendations {
            if seen.insert(recommendation.as_str()) {
                summary.recommendations.push(recommendation.clone());
            }
        }
    }

    summary
}

/// Logical AND over every module's compliance flag
pub fn overall_compliant(results: &ModuleResults) -> bool {
    results.iter().all(|(_, result)| result.compliant)
}

/// Assemble the full report for a round
pub fn build_report(results: ModuleResults) -> ComplianceReport {
    let summary = aggregate(&results);
    ComplianceReport {
        overall_compliant: overall_compliant(&results),
        module_results: results,
        summary,
    }
}

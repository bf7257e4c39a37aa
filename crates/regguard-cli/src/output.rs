//! Plain-text rendering for terminal output

use regguard_core::{ComplianceReport, RequirementsEntry, RequirementsMap, Severity};
use regguard_telemetry::MetricsSnapshot;
use std::fmt;

/// Text view of one checked input
pub struct ReportView<'a> {
    pub source: &'a str,
    pub report: &'a ComplianceReport,
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let verdict = if report.overall_compliant {
            "COMPLIANT"
        } else {
            "NON-COMPLIANT"
        };
        writeln!(f, "{}: {}", self.source, verdict)?;

        for (name, result) in report.module_results.iter() {
            let status = if result.compliant { "pass" } else { "FAIL" };
            writeln!(f, "  [{}] {}", status, name)?;
            for violation in &result.violations {
                writeln!(
                    f,
                    "      {:<8} {}: {}",
                    violation.severity, violation.kind, violation.message
                )?;
            }
        }

        let counts: Vec<String> = Severity::ALL
            .iter()
            .rev()
            .map(|s| format!("{} {}", report.summary.count(*s), s))
            .collect();
        writeln!(
            f,
            "  {} violations ({})",
            report.summary.total_violations,
            counts.join(", ")
        )?;

        if !report.summary.recommendations.is_empty() {
            writeln!(f, "  Recommendations:")?;
            for recommendation in &report.summary.recommendations {
                writeln!(f, "    - {}", recommendation)?;
            }
        }
        Ok(())
    }
}

/// Text view of every module's requirements
pub struct RequirementsView<'a>(pub &'a RequirementsMap);

impl fmt::Display for RequirementsView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, entry) in self.0.iter() {
            match entry {
                RequirementsEntry::Described(req) => {
                    writeln!(f, "{} ({}, {})", name, req.domain, req.regulation)?;
                    writeln!(f, "  {}", req.description)?;
                    writeln!(f, "  non-compliant at {}", req.non_compliant_at)?;
                    writeln!(f, "  parameters: {}", req.parameters)?;
                }
                RequirementsEntry::Unavailable { error } => {
                    writeln!(f, "{} (unavailable: {})", name, error)?;
                }
            }
        }
        Ok(())
    }
}

pub fn render_totals(snapshot: &MetricsSnapshot) -> String {
    format!(
        "{} inputs checked, {} non-compliant, {} violations, {} module failures",
        snapshot.total_rounds,
        snapshot.non_compliant_rounds,
        snapshot.total_violations,
        snapshot.module_failures
    )
}

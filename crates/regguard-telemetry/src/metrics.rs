//! In-process round metrics

use regguard_core::{ComplianceReport, MODULE_ERROR};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters over compliance rounds, cheap to clone and share
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    total_rounds: AtomicU64,
    non_compliant_rounds: AtomicU64,
    total_violations: AtomicU64,
    module_failures: AtomicU64,
    total_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished round and how long it took
    pub fn record_report(&self, report: &ComplianceReport, latency_us: u64) {
        let inner = &self.inner;
        inner.total_rounds.fetch_add(1, Ordering::Relaxed);
        if !report.overall_compliant {
            inner.non_compliant_rounds.fetch_add(1, Ordering::Relaxed);
        }
        inner
            .total_violations
            .fetch_add(report.summary.total_violations as u64, Ordering::Relaxed);

        let failures = report
            .module_results
            .iter()
            .filter(|(_, r)| r.violations.iter().any(|v| v.kind == MODULE_ERROR))
            .count();
        inner
            .module_failures
            .fetch_add(failures as u64, Ordering::Relaxed);

        inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_rounds: self.inner.total_rounds.load(Ordering::Relaxed),
            non_compliant_rounds: self.inner.non_compliant_rounds.load(Ordering::Relaxed),
            total_violations: self.inner.total_violations.load(Ordering::Relaxed),
            module_failures: self.inner.module_failures.load(Ordering::Relaxed),
            total_latency_us: self.inner.total_latency_us.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_rounds: u64,
    pub non_compliant_rounds: u64,
    pub total_violations: u64,
    pub module_failures: u64,
    pub total_latency_us: u64,
}

impl MetricsSnapshot {
    /// Average latency per round
    pub fn avg_latency_us(&self) -> u64 {
        if self.total_rounds == 0 {
            0
        } else {
            self.total_latency_us / self.total_rounds
        }
    }

    /// Fraction of rounds that were not compliant
    pub fn non_compliance_rate(&self) -> f64 {
        if self.total_rounds == 0 {
            0.0
        } else {
            self.non_compliant_rounds as f64 / self.total_rounds as f64
        }
    }

    /// Average number of violations per round
    pub fn violations_per_round(&self) -> f64 {
        if self.total_rounds == 0 {
            0.0
        } else {
            self.total_violations as f64 / self.total_rounds as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regguard_core::{ModuleResult, ModuleResults, Severity, Summary};

    fn report(results: ModuleResults, total_violations: usize) -> ComplianceReport {
        let mut summary = Summary::empty();
        summary.total_violations = total_violations;
        let overall_compliant = results.iter().all(|(_, r)| r.compliant);
        ComplianceReport {
            overall_compliant,
            module_results: results,
            summary,
        }
    }

    #[test]
    fn test_metrics_collection() {
        let metrics = MetricsCollector::new();

        let mut clean = ModuleResults::new();
        clean.insert("a", ModuleResult::pass());
        metrics.record_report(&report(clean, 0), 1000);

        let mut failing = ModuleResults::new();
        failing.insert("a", ModuleResult::module_error("boom"));
        failing.insert(
            "b",
            ModuleResult::from_findings(
                vec![regguard_core::Violation::new("X", "x", Severity::Low)],
                Vec::new(),
                Severity::High,
            ),
        );
        metrics.record_report(&report(failing, 2), 3000);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_rounds, 2);
        assert_eq!(snapshot.non_compliant_rounds, 1);
        assert_eq!(snapshot.total_violations, 2);
        assert_eq!(snapshot.module_failures, 1);
        assert_eq!(snapshot.avg_latency_us(), 2000);
        assert_eq!(snapshot.non_compliance_rate(), 0.5);
        assert_eq!(snapshot.violations_per_round(), 1.0);
    }

    #[test]
    fn test_empty_snapshot_rates() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.avg_latency_us(), 0);
        assert_eq!(snapshot.non_compliance_rate(), 0.0);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = MetricsCollector::new();
        let other = metrics.clone();
        other.record_report(&report(ModuleResults::new(), 0), 10);
        assert_eq!(metrics.snapshot().total_rounds, 1);
    }
}

//! RegGuard Telemetry
//!
//! Audit and metrics support for RegGuard.
//!
//! Provides:
//! - A SHA-256 hash-chained audit trail of compliance rounds, persisted as JSON lines
//! - In-process counters for rounds, violations and module failures

pub mod audit;
pub mod metrics;

pub use audit::{AuditEvent, AuditSeverity, AuditTrail};
pub use metrics::{MetricsCollector, MetricsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditEvent, AuditTrail};
    pub use crate::metrics::MetricsCollector;
}

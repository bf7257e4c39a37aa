//! RegGuard Core
//!
//! Core types and error handling shared across RegGuard components.
//!
//! This crate provides:
//! - Violations, severities, and per-module results
//! - The aggregated compliance report and its summary
//! - Module configuration and evaluation context types
//! - Error types and result handling

pub mod error;
pub mod report;
pub mod types;

pub use error::{Error, Result};
pub use report::{ComplianceReport, ModuleResults, NamedMap, RequirementsMap, Summary};
pub use types::{
    Context, ModuleConfig, ModuleResult, Requirements, RequirementsEntry, Severity, Violation,
    ANALYSIS_ERROR, MODULE_ERROR,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::report::{ComplianceReport, ModuleResults, RequirementsMap, Summary};
    pub use crate::types::{
        Context, ModuleConfig, ModuleResult, Requirements, Severity, Violation,
    };
}

//! RegGuard Engine
//!
//! Coordinates policy modules into a single compliance verdict.
//!
//! - [`ModuleRegistry`]: named modules with enabled flags, in registration order
//! - [`ComplianceEngine`]: runs enabled modules concurrently with failure isolation
//! - [`aggregator`]: pure summary and verdict computation over module results
//! - [`EngineConfig`]: YAML configuration for which modules to build

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod registry;

pub use aggregator::{aggregate, build_report, overall_compliant};
pub use config::{EngineConfig, ModuleSpec};
pub use engine::ComplianceEngine;
pub use registry::ModuleRegistry;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::ComplianceEngine;
    pub use crate::registry::ModuleRegistry;
    pub use regguard_core::prelude::*;
    pub use regguard_modules::prelude::*;
}

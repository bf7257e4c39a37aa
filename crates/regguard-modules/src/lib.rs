//! RegGuard Policy Modules
//!
//! Pluggable heuristic checks, one per regulatory domain. Every module
//! implements [`PolicyModule`]; the engine holds them as trait objects and
//! never depends on a concrete variant.
//!
//! Built-in modules:
//! - `fuel_efficiency`: wasteful compute patterns (non-compliant at HIGH)
//! - `health_data`: protected health information (non-compliant at CRITICAL)
//! - `workplace_safety`: code hygiene hazards (non-compliant at HIGH)
//! - `data_protection`: personal data and consent (non-compliant at HIGH)
//! - `privilege`: privileged communications (non-compliant at HIGH)
//! - `sanctions`: trade sanctions screening (non-compliant at CRITICAL)

pub mod catalog;
pub mod data_protection;
pub mod fuel_efficiency;
pub mod health_data;
pub mod lexicon;
pub mod module;
pub mod privilege;
pub mod sanctions;
pub mod workplace_safety;

pub use catalog::ModuleKind;
pub use lexicon::Lexicon;
pub use module::{contain_analysis, PolicyModule};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::ModuleKind;
    pub use crate::data_protection::DataProtectionModule;
    pub use crate::fuel_efficiency::FuelEfficiencyModule;
    pub use crate::health_data::HealthDataModule;
    pub use crate::module::PolicyModule;
    pub use crate::privilege::PrivilegeModule;
    pub use crate::sanctions::SanctionsModule;
    pub use crate::workplace_safety::WorkplaceSafetyModule;
}

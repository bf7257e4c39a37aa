//! Catalog of built-in policy modules

use crate::data_protection::DataProtectionModule;
use crate::fuel_efficiency::FuelEfficiencyModule;
use crate::health_data::HealthDataModule;
use crate::module::PolicyModule;
use crate::privilege::PrivilegeModule;
use crate::sanctions::SanctionsModule;
use crate::workplace_safety::WorkplaceSafetyModule;
use regguard_core::{Error, ModuleConfig, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The built-in policy module variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    FuelEfficiency,
    HealthData,
    WorkplaceSafety,
    DataProtection,
    Privilege,
    Sanctions,
}

impl ModuleKind {
    /// Every built-in kind, in default registration order
    pub const ALL: [ModuleKind; 6] = [
        Self::FuelEfficiency,
        Self::HealthData,
        Self::WorkplaceSafety,
        Self::DataProtection,
        Self::Privilege,
        Self::Sanctions,
    ];

    /// Catalog name, also the default registry name
    pub fn name(&self) -> &'static str {
        match self {
            Self::FuelEfficiency => FuelEfficiencyModule::NAME,
            Self::HealthData => HealthDataModule::NAME,
            Self::WorkplaceSafety => WorkplaceSafetyModule::NAME,
            Self::DataProtection => DataProtectionModule::NAME,
            Self::Privilege => PrivilegeModule::NAME,
            Self::Sanctions => SanctionsModule::NAME,
        }
    }

    /// Look up a kind by catalog name
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnknownKind(name.to_string()))
    }

    /// Construct a module of this kind from configuration options
    pub fn build(&self, config: &ModuleConfig) -> Result<Arc<dyn PolicyModule>> {
        let module: Arc<dyn PolicyModule> = match self {
            Self::FuelEfficiency => Arc::new(FuelEfficiencyModule::from_config(config)?),
            Self::HealthData => Arc::new(HealthDataModule::from_config(config)?),
            Self::WorkplaceSafety => Arc::new(WorkplaceSafetyModule::from_config(config)?),
            Self::DataProtection => Arc::new(DataProtectionModule::from_config(config)?),
            Self::Privilege => Arc::new(PrivilegeModule::from_config(config)?),
            Self::Sanctions => Arc::new(SanctionsModule::from_config(config)?),
        };
        Ok(module)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModuleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in ModuleKind::ALL {
            assert_eq!(ModuleKind::from_name(kind.name()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind() {
        assert!(matches!(
            "astrology".parse::<ModuleKind>(),
            Err(Error::UnknownKind(name)) if name == "astrology"
        ));
    }

    #[test]
    fn test_serde_names_match_catalog() {
        for kind in ModuleKind::ALL {
            let value = serde_json::to_value(kind).unwrap();
            assert_eq!(value, kind.name());
        }
    }

    #[test]
    fn test_build_every_kind() {
        for kind in ModuleKind::ALL {
            let module = kind.build(&ModuleConfig::new()).unwrap();
            assert_eq!(module.name(), kind.name());
            assert_eq!(module.describe().unwrap().module, kind.name());
        }
    }

    #[test]
    fn test_build_rejects_mistyped_options() {
        let config = ModuleConfig::new().with("max_loop_nesting", "deep");
        assert!(matches!(
            ModuleKind::FuelEfficiency.build(&config),
            Err(Error::Config(_))
        ));
    }
}

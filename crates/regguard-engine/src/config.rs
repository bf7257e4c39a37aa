//! Engine configuration

use regguard_core::{Error, ModuleConfig, Result};
use regguard_modules::ModuleKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Configuration for a compliance engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Modules to register, in registration order
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

/// One module entry in the engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Registry name; defaults to the kind's catalog name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Which built-in module to construct
    pub kind: ModuleKind,

    /// Whether the module starts enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Module-specific options
    #[serde(default)]
    pub config: ModuleConfig,
}

impl ModuleSpec {
    /// Spec for a built-in module with default options
    pub fn new(kind: ModuleKind) -> Self {
        Self {
            name: None,
            kind,
            enabled: true,
            config: ModuleConfig::new(),
        }
    }

    /// Name the module will be registered under
    pub fn registry_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind.name())
    }
}

impl EngineConfig {
    /// Parse configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Reject configurations that register two modules under one name
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.modules {
            if !seen.insert(spec.registry_name()) {
                return Err(Error::DuplicateName(spec.registry_name().to_string()));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    /// Every built-in module, enabled, with default options
    fn default() -> Self {
        Self {
            modules: ModuleKind::ALL.iter().copied().map(ModuleSpec::new).collect(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_includes_every_kind() {
        let config = EngineConfig::default();
        let names: Vec<_> = config.modules.iter().map(|m| m.registry_name()).collect();
        assert_eq!(
            names,
            vec![
                "fuel_efficiency",
                "health_data",
                "workplace_safety",
                "data_protection",
                "privilege",
                "sanctions"
            ]
        );
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
modules:
  - kind: sanctions
  - name: gdpr
    kind: data_protection
    enabled: false
    config:
      require_consent: true
      some_future_option: 3
"#;

        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.modules[0].registry_name(), "sanctions");
        assert!(config.modules[0].enabled);
        assert_eq!(config.modules[1].registry_name(), "gdpr");
        assert!(!config.modules[1].enabled);
        assert_eq!(
            config.modules[1].config.get("require_consent"),
            Some(&serde_json::Value::Bool(true))
        );
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let yaml = "modules:\n  - kind: astrology\n";
        assert!(matches!(EngineConfig::from_yaml(yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = "modules:\n  - kind: sanctions\n  - kind: sanctions\n";
        assert!(matches!(
            EngineConfig::from_yaml(yaml),
            Err(Error::DuplicateName(name)) if name == "sanctions"
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regguard.yaml");
        std::fs::write(&path, "modules:\n  - kind: privilege\n").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.modules[0].kind, ModuleKind::Privilege);

        assert!(EngineConfig::from_file(dir.path().join("missing.yaml")).is_err());
    }
}

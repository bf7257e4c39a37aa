//! Error types for RegGuard

/// Result type alias using RegGuard's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for RegGuard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A registry operation referenced a module name that was never registered
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// A non-overwriting registration collided with an existing name
    #[error("module already registered: {0}")]
    DuplicateName(String),

    /// A configuration referenced a module kind outside the catalog
    #[error("unknown module kind: {0}")]
    UnknownKind(String),

    /// Invalid module options or engine configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A heuristic failed while inspecting content
    #[error("analysis error: {0}")]
    Analysis(String),

    /// A module failed past its own boundary
    #[error("module error: {0}")]
    Module(String),

    /// IO errors while loading configuration
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new analysis error
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    /// Create a new module error
    pub fn module(msg: impl Into<String>) -> Self {
        Self::Module(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error came from a configuration operation
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::UnknownModule(_)
                | Self::DuplicateName(_)
                | Self::UnknownKind(_)
                | Self::Config(_)
                | Self::Yaml(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::UnknownModule("gdpr".to_string()).to_string(),
            "unknown module: gdpr"
        );
        assert_eq!(
            Error::config("bad threshold").to_string(),
            "configuration error: bad threshold"
        );
    }

    #[test]
    fn test_config_classification() {
        assert!(Error::DuplicateName("a".into()).is_config());
        assert!(Error::config("x").is_config());
        assert!(!Error::analysis("x").is_config());
        assert!(!Error::module("x").is_config());
    }
}

//! Configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Engine-wide configuration.
///
/// Passed explicitly into the components that need it; there is no global
/// registry. All fields have defaults so a zero-config engine works.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Registered projector name used for any type in the file/media family
    pub default_file_projector: Option<String>,

    /// Registered projector name used for any type in the user family
    pub default_user_projector: Option<String>,

    /// Namespace roots searched, in order, when the conventional projector
    /// name does not resolve
    pub alternate_projector_namespaces: Vec<String>,

    /// Reject requested includes the projector does not declare
    pub use_strict_includes: bool,

    /// Master switch for the result cache
    pub api_cache_enabled: bool,
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.default_file_projector.is_none());
        assert!(config.alternate_projector_namespaces.is_empty());
        assert!(!config.use_strict_includes);
        assert!(!config.api_cache_enabled);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
            default_file_projector: media::projectors::FileProjector
            default_user_projector: users::projectors::UserProjector
            alternate_projector_namespaces:
                - shop
                - crm
            use_strict_includes: true
            api_cache_enabled: true
        "#;

        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.default_file_projector.as_deref(),
            Some("media::projectors::FileProjector")
        );
        assert_eq!(config.alternate_projector_namespaces, ["shop", "crm"]);
        assert!(config.use_strict_includes);
        assert!(config.api_cache_enabled);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = EngineConfig::from_yaml_str("use_strict_includes: true").unwrap();
        assert!(config.use_strict_includes);
        assert!(!config.api_cache_enabled);
        assert!(config.default_user_projector.is_none());
    }
}

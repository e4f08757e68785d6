//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl ProviderConfig {
    /// Command timeout, if one is configured.
    pub fn command_timeout(&self) -> Option<std::time::Duration> {
        self.command_timeout_secs.map(std::time::Duration::from_secs)
    }
}

impl BindingConfig {
    /// Table type configured for a structured parameter.
    ///
    /// Exact name first, then ASCII case-insensitive.
    pub fn table_type_for(&self, parameter: &str) -> Option<&str> {
        self.table_types
            .get(parameter)
            .or_else(|| {
                self.table_types
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(parameter))
                    .map(|(_, type_name)| type_name)
            })
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_from_yaml_full() {
        let yaml = r#"
provider:
  command_type: text
  command_timeout_secs: 30
binding:
  table_types:
    Lines: dbo.OrderLineList
    "[sales].Tags": "[sales].[Tag List]"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.provider.command_type, CommandType::Text);
        assert_eq!(config.provider.command_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.binding.table_type_for("Lines"), Some("dbo.OrderLineList"));
        assert_eq!(config.binding.table_type_for("lines"), Some("dbo.OrderLineList"));
        assert_eq!(config.binding.table_type_for("Other"), None);
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.provider.command_type, CommandType::StoredProcedure);
        assert_eq!(config.provider.command_timeout(), None);
        assert!(config.binding.table_types.is_empty());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let yaml = "provider:\n  command_timeout_secs: 0\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("command_timeout_secs"));
    }

    #[test]
    fn test_bad_table_type_rejected() {
        let yaml = "binding:\n  table_types:\n    Lines: \"dbo.\"\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_command_type_rejected() {
        let yaml = "provider:\n  command_type: batch\n";
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(crate::error::BindError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/mssql-bind.yaml").unwrap_err();
        assert!(matches!(err, crate::error::BindError::Io(_)));
    }
}

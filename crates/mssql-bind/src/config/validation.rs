//! Configuration validation.

use super::Config;
use crate::core::identifier::{validate_identifier, validate_type_name};
use crate::error::{BindError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if let Some(0) = config.provider.command_timeout_secs {
        return Err(BindError::Config(
            "provider.command_timeout_secs must be at least 1".into(),
        ));
    }

    for (parameter, type_name) in &config.binding.table_types {
        validate_identifier(parameter).map_err(|e| {
            BindError::Config(format!("binding.table_types key {:?}: {}", parameter, e))
        })?;
        validate_type_name(type_name).map_err(|e| {
            BindError::Config(format!("binding.table_types.{}: {}", parameter, e))
        })?;
    }

    Ok(())
}

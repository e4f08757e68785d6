//! Configuration type definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Command settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Parameter binding settings.
    #[serde(default)]
    pub binding: BindingConfig,
}

/// How command text is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// The text names a stored procedure.
    #[default]
    StoredProcedure,
    /// The text is a batch of SQL.
    Text,
}

/// Command settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub command_type: CommandType,

    /// Command timeout in seconds (executor default when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

/// Parameter binding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindingConfig {
    /// User-defined table type per structured parameter name, used when the
    /// member and its element type carry none.
    #[serde(default)]
    pub table_types: BTreeMap<String, String>,
}

//! Error types for the binding library.

use thiserror::Error;

use crate::core::SqlType;

/// Main error type for binding and materialization operations.
#[derive(Error, Debug)]
pub enum BindError {
    /// A required argument or piece of metadata is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The bound shape and the executed call disagree.
    #[error("Binding mismatch for '{member}': {message}")]
    BindingMismatch { member: String, message: String },

    /// A value could not be converted into the member it was assigned to.
    #[error("Conversion failed for '{member}': {source}")]
    Conversion {
        member: String,
        #[source]
        source: ConvertError,
    },

    /// A query returned a different number of rows than the caller asked for.
    #[error("Cardinality error: {0}")]
    Cardinality(String),

    /// The external command executor failed.
    #[error("Executor error: {0}")]
    Executor(String),

    /// IO error (configuration files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BindError {
    /// Create a BindingMismatch error for a member or parameter name.
    pub fn mismatch(member: impl Into<String>, message: impl Into<String>) -> Self {
        BindError::BindingMismatch {
            member: member.into(),
            message: message.into(),
        }
    }

    /// Create a Conversion error for a member or parameter name.
    pub fn conversion(member: impl Into<String>, source: ConvertError) -> Self {
        BindError::Conversion {
            member: member.into(),
            source,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Value-level conversion failure, independent of which member was targeted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// NULL was assigned to a slot without a nullable wrapper.
    #[error("NULL cannot be assigned to a non-nullable {expected}")]
    UnexpectedNull { expected: &'static str },

    /// The value's type cannot be converted to the slot type.
    #[error("cannot convert {found:?} to {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: SqlType,
    },

    /// The value is of a compatible type but does not fit the slot.
    #[error("value {value} is out of range for {expected}")]
    OutOfRange {
        expected: &'static str,
        value: String,
    },

    /// Text or ordinal does not name a variant of the target enumeration.
    #[error("'{value}' is not a variant of {enum_name}")]
    UnknownVariant {
        enum_name: &'static str,
        value: String,
    },
}

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, BindError>;

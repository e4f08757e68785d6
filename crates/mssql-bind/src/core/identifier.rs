//! Validation of parameter names and user-defined table type names.
//!
//! Parameter names come from member names or explicit column overrides, and
//! table type names come from attributes or configuration. Neither is ever
//! spliced into command text here, but both are checked before they reach
//! an executor.

use crate::error::{BindError, Result};

/// Maximum identifier length (SQL Server `sysname`).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Maximum parts in a qualified type name (`database.schema.type`).
const MAX_NAME_PARTS: usize = 3;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes
/// - Identifiers exceeding maximum length
///
/// # Errors
///
/// Returns `BindError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BindError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(BindError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(BindError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} characters (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.chars().count(),
            name
        )));
    }

    Ok(())
}

/// Split a possibly qualified type name such as `dbo.OrderLines` or
/// `[sales].[Order Lines]` into its unquoted parts, validating each.
pub fn split_type_name(name: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '[' if !quoted && current.is_empty() => quoted = true,
            ']' if quoted => {
                if chars.peek() == Some(&']') {
                    chars.next();
                    current.push(']');
                } else {
                    quoted = false;
                }
            }
            '.' if !quoted => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    if quoted {
        return Err(BindError::Config(format!(
            "Unterminated bracket in type name: {:?}",
            name
        )));
    }
    parts.push(current);

    if parts.len() > MAX_NAME_PARTS {
        return Err(BindError::Config(format!(
            "Type name has more than {} parts: {:?}",
            MAX_NAME_PARTS, name
        )));
    }
    for part in &parts {
        validate_identifier(part)?;
    }
    Ok(parts)
}

/// Validate a user-defined table type name.
pub fn validate_type_name(name: &str) -> Result<()> {
    split_type_name(name).map(|_| ())
}

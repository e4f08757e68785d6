//! Resolved column targets.

use crate::core::{DeclaredType, MemberDef, ParamDef};
use crate::error::{BindError, Result};

/// Where a column's value goes.
#[derive(Debug, Clone, Copy)]
pub enum BindingTarget {
    Property(&'static MemberDef),
    Field(&'static MemberDef),
    ConstructorParameter {
        /// Index of the constructor in its shape.
        constructor: usize,
        /// Position of the parameter in the constructor.
        position: usize,
        param: &'static ParamDef,
    },
}

/// A column bound to exactly one target.
#[derive(Debug, Clone)]
pub struct MemberBinding {
    column_name: String,
    target: BindingTarget,
}

impl MemberBinding {
    /// Bind `column_name` to `target`. The column name must not be empty.
    pub fn new(column_name: impl Into<String>, target: BindingTarget) -> Result<Self> {
        let column_name = column_name.into();
        if column_name.is_empty() {
            return Err(BindError::Config(format!(
                "cannot bind an empty column name to '{}'",
                target_name(&target)
            )));
        }
        Ok(Self {
            column_name,
            target,
        })
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn target(&self) -> BindingTarget {
        self.target
    }

    /// Declared type of the target slot.
    pub fn target_type(&self) -> DeclaredType {
        match self.target {
            BindingTarget::Property(m) | BindingTarget::Field(m) => m.declared,
            BindingTarget::ConstructorParameter { param, .. } => param.declared,
        }
    }

    /// Declared name of the target slot.
    pub fn target_name(&self) -> &'static str {
        target_name(&self.target)
    }

    pub fn is_constructor_parameter(&self) -> bool {
        matches!(self.target, BindingTarget::ConstructorParameter { .. })
    }
}

fn target_name(target: &BindingTarget) -> &'static str {
    match *target {
        BindingTarget::Property(m) | BindingTarget::Field(m) => m.name,
        BindingTarget::ConstructorParameter { param, .. } => param.name,
    }
}

/// Case-insensitive name comparison, ASCII fast path first.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || (!a.is_ascii() && a.to_lowercase() == b.to_lowercase())
}

//! Declared member types.
//!
//! A [`DeclaredType`] is what a member, field or constructor parameter says it
//! holds, as opposed to [`SqlType`], which is what a column or parameter
//! carries on the wire. Constructor selection compares the two.

use std::fmt;

use super::value::SqlType;

/// Static description of a fieldless enumeration.
#[derive(Debug, PartialEq, Eq)]
pub struct EnumInfo {
    /// Rust type name.
    pub name: &'static str,
    /// Integer type the ordinals are stored as.
    pub underlying: SqlType,
    /// `(label, ordinal)` pairs in declaration order.
    pub variants: &'static [(&'static str, i64)],
}

impl EnumInfo {
    /// Find the ordinal for a label, exact case first.
    pub fn ordinal_of(&self, label: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(l, _)| *l == label)
            .or_else(|| {
                self.variants
                    .iter()
                    .find(|(l, _)| l.eq_ignore_ascii_case(label))
            })
            .map(|(_, o)| *o)
    }

    /// Find the label for an ordinal.
    pub fn label_of(&self, ordinal: i64) -> Option<&'static str> {
        self.variants
            .iter()
            .find(|(_, o)| *o == ordinal)
            .map(|(l, _)| *l)
    }
}

/// A concrete enumeration value read from a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub info: &'static EnumInfo,
    pub label: &'static str,
    pub ordinal: i64,
}

/// What kind of value a slot holds, nullable wrapper aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A value with a direct protocol representation.
    Scalar(SqlType),
    /// A single character, carried as text.
    Char,
    /// A fieldless enumeration.
    Enum(&'static EnumInfo),
    /// A collection of records bound as one table value.
    Table {
        /// Type name of the element records.
        element: &'static str,
    },
}

/// Declared type of a member, field or constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredType {
    pub kind: ValueKind,
    /// Whether the slot is wrapped in `Option`.
    pub nullable: bool,
}

impl DeclaredType {
    pub const fn scalar(sql_type: SqlType) -> Self {
        Self {
            kind: ValueKind::Scalar(sql_type),
            nullable: false,
        }
    }

    pub const fn char() -> Self {
        Self {
            kind: ValueKind::Char,
            nullable: false,
        }
    }

    pub const fn enumeration(info: &'static EnumInfo) -> Self {
        Self {
            kind: ValueKind::Enum(info),
            nullable: false,
        }
    }

    pub const fn table(element: &'static str) -> Self {
        Self {
            kind: ValueKind::Table { element },
            nullable: true,
        }
    }

    /// Wrap in the nullable wrapper.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The same type with the nullable wrapper stripped.
    #[must_use]
    pub const fn underlying(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, ValueKind::Scalar(SqlType::Bool))
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.kind, ValueKind::Table { .. })
    }

    /// The protocol type values of this slot are stored as once coerced.
    ///
    /// Booleans travel as `int`, enumerations and characters as text.
    /// Table slots have no storage type.
    pub fn storage_type(&self) -> Option<SqlType> {
        match self.kind {
            ValueKind::Scalar(SqlType::Bool) => Some(SqlType::I32),
            ValueKind::Scalar(t) => Some(t),
            ValueKind::Char | ValueKind::Enum(_) => Some(SqlType::Text),
            ValueKind::Table { .. } => None,
        }
    }

    /// Whether a column of type `column` can feed this slot directly.
    ///
    /// Accepts an exact match, a match on the type under the nullable
    /// wrapper, an enumeration fed by its underlying integer type or by text,
    /// and a character fed by text.
    pub fn accepts_column(&self, column: SqlType) -> bool {
        match self.underlying().kind {
            ValueKind::Scalar(t) => t == column,
            ValueKind::Enum(info) => info.underlying == column || column == SqlType::Text,
            ValueKind::Char => column == SqlType::Text,
            ValueKind::Table { .. } => false,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = match self.kind {
            ValueKind::Scalar(t) => t.name(),
            ValueKind::Char => "char",
            ValueKind::Enum(info) => info.name,
            ValueKind::Table { element } => element,
        };
        if self.nullable {
            write!(f, "Option<{}>", inner)
        } else {
            f.write_str(inner)
        }
    }
}

//! Core abstractions shared by parameter binding and row materialization.
//!
//! - [`value`]: SQL value representation with zero-copy payloads
//! - [`types`]: declared member types and enumeration metadata
//! - [`shape`]: binding tables and the traits bound objects implement
//! - [`field`]: [`SqlField`] implementations for the supported member types
//! - [`identifier`]: parameter and type name validation

pub mod field;
pub mod identifier;
pub mod shape;
pub mod types;
pub mod value;

// Re-export commonly used types for convenience
pub use field::enum_from_sql;
pub use shape::{
    backing_field_name, Bindable, BindableType, ConstructorDef, MemberDef, MemberKind,
    MemberValue, ParamDef, RecordSet, Shape, SqlEnum, SqlField, Visibility,
};
pub use types::{DeclaredType, EnumInfo, EnumValue, ValueKind};
pub use value::{SqlType, SqlValue};

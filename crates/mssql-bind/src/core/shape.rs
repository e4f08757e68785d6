//! Binding tables and the capability traits bound objects implement.
//!
//! A [`Shape`] is the static description of a type: its members (properties
//! and fields, in declaration order) and its constructors. It is produced once
//! per type, normally by `#[derive(Bindable)]`, and lives for the rest of the
//! process.
//!
//! - [`Bindable`]: object-safe access to a value's members by name
//! - [`BindableType`]: static access to the shape and to constructors
//! - [`SqlField`]: a member type with a protocol representation
//! - [`SqlEnum`]: a fieldless enumeration bound by label
//! - [`RecordSet`]: a member type bound as a table value

use std::any::TypeId;
use std::fmt;

use crate::error::{ConvertError, Result};

use super::types::{DeclaredType, EnumInfo, EnumValue};
use super::value::SqlValue;

/// Name of the synthesized slot backing a read-only property.
pub fn backing_field_name(member: &str) -> String {
    format!("<{}>k__BackingField", member)
}

/// Whether a member is a property or a plain field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Field,
}

/// Member and constructor visibility tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Internal,
    Private,
}

/// One member of a shape.
#[derive(Debug, Clone)]
pub struct MemberDef {
    /// Declared member name.
    pub name: &'static str,
    pub kind: MemberKind,
    pub visibility: Visibility,
    /// Explicit bound name, overriding `name`.
    pub column: Option<&'static str>,
    /// Excluded from parameter binding.
    pub not_mapped: bool,
    pub is_static: bool,
    pub readable: bool,
    pub writable: bool,
    pub declared: DeclaredType,
    /// User-defined table type for structured members.
    pub table_type: Option<&'static str>,
}

impl MemberDef {
    /// A public, readable and writable property.
    pub fn property(name: &'static str, declared: DeclaredType) -> Self {
        Self {
            name,
            kind: MemberKind::Property,
            visibility: Visibility::Public,
            column: None,
            not_mapped: false,
            is_static: false,
            readable: true,
            writable: true,
            declared,
            table_type: None,
        }
    }

    /// A private, writable field.
    pub fn field(name: &'static str, declared: DeclaredType) -> Self {
        Self {
            kind: MemberKind::Field,
            visibility: Visibility::Private,
            ..Self::property(name, declared)
        }
    }

    #[must_use]
    pub fn renamed(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    #[must_use]
    pub fn not_mapped(mut self) -> Self {
        self.not_mapped = true;
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }

    #[must_use]
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_table_type(mut self, table_type: &'static str) -> Self {
        self.table_type = Some(table_type);
        self
    }

    /// Name the member binds under.
    pub fn bound_name(&self) -> &'static str {
        self.column.unwrap_or(self.name)
    }
}

/// One constructor parameter.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: &'static str,
    pub declared: DeclaredType,
}

impl ParamDef {
    pub fn new(name: &'static str, declared: DeclaredType) -> Self {
        Self { name, declared }
    }
}

/// One way of constructing a shape's type.
#[derive(Debug, Clone)]
pub struct ConstructorDef {
    index: usize,
    pub visibility: Visibility,
    pub params: Vec<ParamDef>,
    /// Marked for explicit selection.
    pub explicit: bool,
}

impl ConstructorDef {
    pub fn new(visibility: Visibility, params: Vec<ParamDef>) -> Self {
        Self {
            index: 0,
            visibility,
            params,
            explicit: false,
        }
    }

    pub fn public(params: Vec<ParamDef>) -> Self {
        Self::new(Visibility::Public, params)
    }

    #[must_use]
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    /// Position among the shape's constructors, in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Static binding table of one type.
#[derive(Debug)]
pub struct Shape {
    type_id: TypeId,
    type_name: &'static str,
    table_type: Option<&'static str>,
    members: Vec<MemberDef>,
    constructors: Vec<ConstructorDef>,
}

impl Shape {
    /// Start an empty shape for `T`.
    pub fn new<T: 'static>(type_name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            table_type: None,
            members: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Set the user-defined table type used when records of this type are
    /// bound as a table value.
    #[must_use]
    pub fn with_table_type(mut self, table_type: &'static str) -> Self {
        self.table_type = Some(table_type);
        self
    }

    #[must_use]
    pub fn with_member(mut self, member: MemberDef) -> Self {
        self.members.push(member);
        self
    }

    #[must_use]
    pub fn with_constructor(mut self, mut constructor: ConstructorDef) -> Self {
        constructor.index = self.constructors.len();
        self.constructors.push(constructor);
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table_type(&self) -> Option<&'static str> {
        self.table_type
    }

    /// All members in declaration order.
    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }

    /// All constructors in declaration order.
    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    /// Find a member by its declared name.
    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Find the writable backing field of a read-only property.
    pub fn backing_field_for(&self, member: &str) -> Option<&MemberDef> {
        let backing = backing_field_name(member);
        self.members.iter().find(|m| {
            m.kind == MemberKind::Field && !m.is_static && m.writable && m.name == backing
        })
    }
}

/// Value read from a member.
pub enum MemberValue<'a> {
    /// A value with a direct protocol representation (possibly NULL).
    Scalar(SqlValue<'a>),
    /// An enumeration value, coerced to its label on the way out.
    Enum(EnumValue),
    /// Records of a table-valued member; `None` when the collection is absent.
    Records(Option<Vec<&'a dyn Bindable>>),
}

impl<'a> MemberValue<'a> {
    pub fn is_null(&self) -> bool {
        match self {
            MemberValue::Scalar(v) => v.is_null(),
            MemberValue::Enum(_) => false,
            MemberValue::Records(r) => r.is_none(),
        }
    }
}

impl fmt::Debug for MemberValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberValue::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            MemberValue::Enum(v) => f.debug_tuple("Enum").field(&v.label).finish(),
            MemberValue::Records(None) => f.write_str("Records(None)"),
            MemberValue::Records(Some(r)) => write!(f, "Records({} rows)", r.len()),
        }
    }
}

/// Object-safe member access.
///
/// `read` and `write` address members by declared name (properties and
/// fields alike). Implementations must accept every readable/writable
/// member listed in their [`Shape`].
pub trait Bindable: Send + Sync {
    /// Binding table of the value's runtime type.
    fn shape(&self) -> &'static Shape;

    /// Read a member. `None` when the shape has no readable member by that name.
    fn read(&self, member: &str) -> Option<MemberValue<'_>>;

    /// Assign a member, converting the value to the member's type.
    fn write(&mut self, member: &str, value: SqlValue<'_>) -> Result<()>;
}

impl<B: Bindable + ?Sized> Bindable for Box<B> {
    fn shape(&self) -> &'static Shape {
        (**self).shape()
    }

    fn read(&self, member: &str) -> Option<MemberValue<'_>> {
        (**self).read(member)
    }

    fn write(&mut self, member: &str, value: SqlValue<'_>) -> Result<()> {
        (**self).write(member, value)
    }
}

/// Static access to a type's binding table and constructors.
pub trait BindableType: Bindable + Sized + 'static {
    fn type_shape() -> &'static Shape;

    /// Build a value through one of the shape's constructors.
    ///
    /// `args` holds one value per constructor parameter, in order.
    fn construct(constructor: &ConstructorDef, args: Vec<SqlValue<'static>>) -> Result<Self>;
}

/// A member type with a protocol representation.
pub trait SqlField: Sized {
    fn declared_type() -> DeclaredType;

    fn to_member_value(&self) -> MemberValue<'_>;

    fn from_sql(value: SqlValue<'_>) -> std::result::Result<Self, ConvertError>;
}

/// A fieldless enumeration bound by label.
pub trait SqlEnum: Copy + Sized + 'static {
    fn enum_info() -> &'static EnumInfo;

    fn label(&self) -> &'static str;

    fn ordinal(&self) -> i64;

    fn from_label(label: &str) -> Option<Self>;

    fn from_ordinal(ordinal: i64) -> Option<Self>;

    fn enum_value(&self) -> EnumValue {
        EnumValue {
            info: Self::enum_info(),
            label: self.label(),
            ordinal: self.ordinal(),
        }
    }
}

/// A member type bound as a table value.
pub trait RecordSet {
    fn declared_type() -> DeclaredType;

    /// The records, or `None` when the collection is absent.
    fn records(&self) -> Option<Vec<&dyn Bindable>>;
}

impl<T: Bindable> RecordSet for Vec<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::table(std::any::type_name::<T>())
    }

    fn records(&self) -> Option<Vec<&dyn Bindable>> {
        Some(self.iter().map(|r| r as &dyn Bindable).collect())
    }
}

impl<T: RecordSet> RecordSet for Option<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type()
    }

    fn records(&self) -> Option<Vec<&dyn Bindable>> {
        self.as_ref().and_then(|r| r.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SqlType;

    struct Person;

    fn person_shape() -> Shape {
        Shape::new::<Person>("Person")
            .with_member(MemberDef::property("Name", DeclaredType::scalar(SqlType::Text)))
            .with_member(
                MemberDef::property("Id", DeclaredType::scalar(SqlType::I32)).read_only(),
            )
            .with_member(MemberDef::field(
                "<Id>k__BackingField",
                DeclaredType::scalar(SqlType::I32),
            ))
            .with_constructor(ConstructorDef::public(vec![]))
            .with_constructor(ConstructorDef::public(vec![ParamDef::new(
                "name",
                DeclaredType::scalar(SqlType::Text),
            )]))
    }

    #[test]
    fn test_backing_field_name() {
        assert_eq!(backing_field_name("UserName"), "<UserName>k__BackingField");
    }

    #[test]
    fn test_shape_lookup() {
        let shape = person_shape();
        assert_eq!(shape.type_id(), TypeId::of::<Person>());
        assert_eq!(shape.member("Name").map(|m| m.kind), Some(MemberKind::Property));
        assert!(shape.member("name").is_none());
        assert_eq!(
            shape.backing_field_for("Id").map(|m| m.name),
            Some("<Id>k__BackingField")
        );
        assert!(shape.backing_field_for("Name").is_none());
    }

    #[test]
    fn test_constructor_indexes_follow_declaration_order() {
        let shape = person_shape();
        let indexes: Vec<usize> = shape.constructors().iter().map(|c| c.index()).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert_eq!(shape.constructors()[1].arity(), 1);
    }

    #[test]
    fn test_bound_name_prefers_override() {
        let m = MemberDef::property("Name", DeclaredType::scalar(SqlType::Text));
        assert_eq!(m.bound_name(), "Name");
        assert_eq!(m.renamed("FullName").bound_name(), "FullName");
    }

    #[test]
    fn test_visibility_orders_public_first() {
        let mut tiers = vec![Visibility::Private, Visibility::Public, Visibility::Internal];
        tiers.sort();
        assert_eq!(
            tiers,
            vec![Visibility::Public, Visibility::Internal, Visibility::Private]
        );
    }
}

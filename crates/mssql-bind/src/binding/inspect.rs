//! Enumerate the members of a shape that participate in parameter binding.

use crate::core::{DeclaredType, MemberKind, Shape, Visibility};

/// One public instance property as parameter binding sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberDescriptor {
    /// Name the member binds under (explicit column name or member name).
    pub bound_name: &'static str,
    /// Declared member name, used to read and write the member.
    pub member_name: &'static str,
    pub declared: DeclaredType,
    pub readable: bool,
    pub writable: bool,
    /// Marked not-mapped.
    pub excluded: bool,
    /// User-defined table type of a structured member.
    pub table_type: Option<&'static str>,
}

/// All public instance properties of `shape`, in declaration order.
///
/// Fields, static members and non-public members are never listed.
pub fn inspect(shape: &Shape) -> Vec<MemberDescriptor> {
    shape
        .members()
        .iter()
        .filter(|m| {
            m.kind == MemberKind::Property && m.visibility == Visibility::Public && !m.is_static
        })
        .map(|m| MemberDescriptor {
            bound_name: m.bound_name(),
            member_name: m.name,
            declared: m.declared,
            readable: m.readable,
            writable: m.writable,
            excluded: m.not_mapped,
            table_type: m.table_type,
        })
        .collect()
}

/// The members that become parameters: readable and not excluded.
pub fn bindable(shape: &Shape) -> Vec<MemberDescriptor> {
    inspect(shape)
        .into_iter()
        .filter(|m| m.readable && !m.excluded)
        .collect()
}

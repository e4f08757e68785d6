//! Column-to-member resolution for one type.

use dashmap::DashMap;
use tracing::{trace, warn};

use crate::core::{
    backing_field_name, BindableType, ConstructorDef, MemberDef, MemberKind, Shape, SqlType,
};

use super::member::{eq_ignore_case, BindingTarget, MemberBinding};

/// Column names and types of a result set, as a memo key.
type ColumnSignature = (Vec<String>, Vec<SqlType>);

/// Resolves result-set columns to the constructors and members of a type.
///
/// Lookups are memoized per column name and per column signature. The memo
/// tables tolerate concurrent use; a lookup racing another for the same key
/// computes the same answer.
#[derive(Debug)]
pub struct TypeMap {
    shape: &'static Shape,
    properties: Vec<&'static MemberDef>,
    fields: Vec<&'static MemberDef>,
    members: DashMap<String, Option<MemberBinding>>,
    constructors: DashMap<ColumnSignature, Option<usize>>,
}

impl TypeMap {
    /// Index the settable members of `shape`.
    ///
    /// Only writable instance members can receive column values; read-only
    /// properties are reached through their backing field instead.
    pub fn new(shape: &'static Shape) -> Self {
        let settable = |kind: MemberKind| -> Vec<&'static MemberDef> {
            shape
                .members()
                .iter()
                .filter(move |m| m.kind == kind && !m.is_static && m.writable)
                .collect()
        };
        Self {
            shape,
            properties: settable(MemberKind::Property),
            fields: settable(MemberKind::Field),
            members: DashMap::new(),
            constructors: DashMap::new(),
        }
    }

    pub fn for_type<T: BindableType>() -> Self {
        Self::new(T::type_shape())
    }

    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// Pick a constructor for a result set with these column names and types.
    ///
    /// Constructors are tried public first, then internal, then private, and
    /// within a tier those with more parameters first. A parameterless
    /// constructor is taken as soon as it is reached; any other needs exactly
    /// one parameter per column, with parameter names matching the columns in
    /// order (ignoring case) and compatible types.
    pub fn find_constructor<S: AsRef<str>>(
        &self,
        names: &[S],
        types: &[SqlType],
    ) -> Option<&'static ConstructorDef> {
        let key: ColumnSignature = (
            names.iter().map(|n| n.as_ref().to_string()).collect(),
            types.to_vec(),
        );
        if let Some(hit) = self.constructors.get(&key) {
            let index = *hit;
            return index.and_then(|i| self.shape.constructors().get(i));
        }

        let found = self.select_constructor(names, types).map(|c| c.index());
        let index = *self.constructors.entry(key).or_insert(found);
        index.and_then(|i| self.shape.constructors().get(i))
    }

    fn select_constructor<S: AsRef<str>>(
        &self,
        names: &[S],
        types: &[SqlType],
    ) -> Option<&'static ConstructorDef> {
        let mut ordered: Vec<&'static ConstructorDef> = self.shape.constructors().iter().collect();
        ordered.sort_by(|a, b| {
            a.visibility
                .cmp(&b.visibility)
                .then_with(|| b.arity().cmp(&a.arity()))
        });

        for ctor in ordered {
            if ctor.arity() == 0 {
                return Some(ctor);
            }
            if ctor.arity() != types.len() || names.len() != types.len() {
                continue;
            }
            let matches = ctor
                .params
                .iter()
                .zip(names.iter().zip(types))
                .all(|(p, (name, ty))| {
                    eq_ignore_case(p.name, name.as_ref()) && p.declared.accepts_column(*ty)
                });
            if matches {
                return Some(ctor);
            }
        }
        None
    }

    /// The single constructor marked for explicit selection, if exactly one is.
    pub fn find_explicit_constructor(&self) -> Option<&'static ConstructorDef> {
        let mut explicit = self.shape.constructors().iter().filter(|c| c.explicit);
        let first = explicit.next()?;
        if explicit.next().is_some() {
            warn!(
                type_name = self.shape.type_name(),
                "more than one constructor is marked explicit; none selected"
            );
            return None;
        }
        Some(first)
    }

    /// Bind a column to a parameter of `constructor` by name, ignoring case.
    pub fn get_constructor_parameter(
        &self,
        constructor: &'static ConstructorDef,
        column: &str,
    ) -> Option<MemberBinding> {
        let position = constructor
            .params
            .iter()
            .position(|p| eq_ignore_case(p.name, column))?;
        let target = BindingTarget::ConstructorParameter {
            constructor: constructor.index(),
            position,
            param: &constructor.params[position],
        };
        MemberBinding::new(column, target).ok()
    }

    /// Bind a column to a settable property or a field.
    ///
    /// Precedence:
    /// 1. property, exact case
    /// 2. property, ignoring case
    /// 3. field, exact case
    /// 4. backing field of a property named like the column, exact case
    /// 5. field, ignoring case
    /// 6. backing field, ignoring case
    pub fn get_member(&self, column: &str) -> Option<MemberBinding> {
        if let Some(hit) = self.members.get(column) {
            return hit.value().clone();
        }

        let found = self.resolve_member(column);
        if found.is_none() {
            trace!(type_name = self.shape.type_name(), column, "no member for column");
        }
        self.members
            .entry(column.to_string())
            .or_insert(found)
            .value()
            .clone()
    }

    fn resolve_member(&self, column: &str) -> Option<MemberBinding> {
        let backing = backing_field_name(column);

        let target = self
            .properties
            .iter()
            .find(|m| m.name == column)
            .or_else(|| self.properties.iter().find(|m| eq_ignore_case(m.name, column)))
            .map(|m| BindingTarget::Property(*m))
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|m| m.name == column)
                    .or_else(|| self.fields.iter().find(|m| m.name == backing))
                    .or_else(|| self.fields.iter().find(|m| eq_ignore_case(m.name, column)))
                    .or_else(|| self.fields.iter().find(|m| eq_ignore_case(m.name, &backing)))
                    .map(|m| BindingTarget::Field(*m))
            })?;
        // Empty column names never resolve.
        MemberBinding::new(column, target).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DeclaredType, EnumInfo, ParamDef, Visibility};

    struct Widget;

    static SIZE: EnumInfo = EnumInfo {
        name: "Size",
        underlying: SqlType::U8,
        variants: &[("Small", 0), ("Large", 1)],
    };

    fn leak(shape: Shape) -> &'static Shape {
        Box::leak(Box::new(shape))
    }

    fn int() -> DeclaredType {
        DeclaredType::scalar(SqlType::I32)
    }

    fn text() -> DeclaredType {
        DeclaredType::scalar(SqlType::Text)
    }

    fn widget_shape() -> &'static Shape {
        leak(
            Shape::new::<Widget>("Widget")
                .with_member(MemberDef::property("Name", text()))
                .with_member(MemberDef::property("name", text()))
                .with_member(MemberDef::property("Id", int()).read_only())
                .with_member(MemberDef::field("<Id>k__BackingField", int()))
                .with_member(MemberDef::field("Colour", text()))
                .with_member(MemberDef::field("weight", int()))
                .with_member(MemberDef::property("Count", int()).static_member())
                .with_member(
                    MemberDef::property("Secret", text()).with_visibility(Visibility::Private),
                ),
        )
    }

    fn target(binding: Option<MemberBinding>) -> Option<(&'static str, bool)> {
        binding.map(|b| match b.target() {
            BindingTarget::Property(m) => (m.name, true),
            BindingTarget::Field(m) => (m.name, false),
            BindingTarget::ConstructorParameter { param, .. } => (param.name, false),
        })
    }

    #[test]
    fn test_get_member_precedence() {
        let map = TypeMap::new(widget_shape());
        assert_eq!(target(map.get_member("Name")), Some(("Name", true)));
        assert_eq!(target(map.get_member("name")), Some(("name", true)));
        assert_eq!(target(map.get_member("NAME")), Some(("Name", true)));
        assert_eq!(target(map.get_member("Colour")), Some(("Colour", false)));
        assert_eq!(target(map.get_member("Id")), Some(("<Id>k__BackingField", false)));
        assert_eq!(target(map.get_member("WEIGHT")), Some(("weight", false)));
        assert_eq!(target(map.get_member("id")), Some(("<Id>k__BackingField", false)));
        assert_eq!(target(map.get_member("Secret")), Some(("Secret", true)));
    }

    #[test]
    fn test_get_member_ignores_static_and_unknown() {
        let map = TypeMap::new(widget_shape());
        assert!(map.get_member("Count").is_none());
        assert!(map.get_member("Missing").is_none());
        // memoized miss stays a miss
        assert!(map.get_member("Missing").is_none());
    }

    fn ctor_shape() -> &'static Shape {
        leak(
            Shape::new::<Widget>("Widget")
                .with_constructor(ConstructorDef::new(Visibility::Private, vec![]))
                .with_constructor(ConstructorDef::public(vec![
                    ParamDef::new("id", int()),
                    ParamDef::new("name", text().nullable()),
                ]))
                .with_constructor(ConstructorDef::public(vec![
                    ParamDef::new("id", int()),
                    ParamDef::new("name", text()),
                    ParamDef::new("size", DeclaredType::enumeration(&SIZE)),
                ]))
                .with_constructor(ConstructorDef::new(
                    Visibility::Internal,
                    vec![ParamDef::new("code", DeclaredType::char())],
                )),
        )
    }

    #[test]
    fn test_find_constructor_by_signature() {
        let map = TypeMap::new(ctor_shape());

        let two = map.find_constructor(&["Id", "Name"], &[SqlType::I32, SqlType::Text]).unwrap();
        assert_eq!(two.index(), 1);

        let three = map
            .find_constructor(&["ID", "NAME", "Size"], &[SqlType::I32, SqlType::Text, SqlType::U8])
            .unwrap();
        assert_eq!(three.index(), 2);

        let by_label = map
            .find_constructor(
                &["id", "name", "size"],
                &[SqlType::I32, SqlType::Text, SqlType::Text],
            )
            .unwrap();
        assert_eq!(by_label.index(), 2);

        let code = map.find_constructor(&["Code"], &[SqlType::Text]).unwrap();
        assert_eq!(code.index(), 3);
    }

    #[test]
    fn test_find_constructor_falls_back_to_default() {
        let map = TypeMap::new(ctor_shape());
        let fallback = map
            .find_constructor(&["id", "name"], &[SqlType::I64, SqlType::Text])
            .unwrap();
        assert_eq!(fallback.arity(), 0);
        // memoized
        let again = map.find_constructor(&["id", "name"], &[SqlType::I64, SqlType::Text]).unwrap();
        assert_eq!(again.index(), fallback.index());
    }

    #[test]
    fn test_find_constructor_none_without_default() {
        let shape = leak(
            Shape::new::<Widget>("Widget")
                .with_constructor(ConstructorDef::public(vec![ParamDef::new("id", int())])),
        );
        let map = TypeMap::new(shape);
        assert!(map.find_constructor(&["Other"], &[SqlType::I32]).is_none());
        assert!(map.find_constructor(&["id", "x"], &[SqlType::I32, SqlType::I32]).is_none());
    }

    #[test]
    fn test_public_default_beats_larger_private() {
        let shape = leak(
            Shape::new::<Widget>("Widget")
                .with_constructor(ConstructorDef::new(
                    Visibility::Private,
                    vec![ParamDef::new("id", int())],
                ))
                .with_constructor(ConstructorDef::public(vec![])),
        );
        let map = TypeMap::new(shape);
        assert_eq!(map.find_constructor(&["id"], &[SqlType::I32]).unwrap().index(), 1);
    }

    #[test]
    fn test_find_explicit_constructor() {
        let one = leak(
            Shape::new::<Widget>("Widget")
                .with_constructor(ConstructorDef::public(vec![]))
                .with_constructor(
                    ConstructorDef::public(vec![ParamDef::new("id", int())]).explicit(),
                ),
        );
        assert_eq!(TypeMap::new(one).find_explicit_constructor().map(|c| c.index()), Some(1));

        let two = leak(
            Shape::new::<Widget>("Widget")
                .with_constructor(ConstructorDef::public(vec![]).explicit())
                .with_constructor(
                    ConstructorDef::public(vec![ParamDef::new("id", int())]).explicit(),
                ),
        );
        assert!(TypeMap::new(two).find_explicit_constructor().is_none());
        assert!(TypeMap::new(widget_shape()).find_explicit_constructor().is_none());
    }

    #[test]
    fn test_get_constructor_parameter() {
        let shape = ctor_shape();
        let map = TypeMap::new(shape);
        let ctor = &shape.constructors()[2];
        let binding = map.get_constructor_parameter(ctor, "SIZE").unwrap();
        assert!(binding.is_constructor_parameter());
        assert_eq!(binding.column_name(), "SIZE");
        assert_eq!(binding.target_name(), "size");
        match binding.target() {
            BindingTarget::ConstructorParameter { constructor, position, .. } => {
                assert_eq!((constructor, position), (2, 2));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(map.get_constructor_parameter(ctor, "weight").is_none());
    }

    #[test]
    fn test_read_only_field_is_not_a_target() {
        let shape = leak(
            Shape::new::<Widget>("Widget")
                .with_member(MemberDef::property("Id", int()))
                .with_member(MemberDef::field("_stamp", int()).read_only())
                .with_member(MemberDef::field("stamp", int())),
        );
        let map = TypeMap::new(shape);
        assert_eq!(target(map.get_member("_stamp")), None);
        // a writable field of similar name still resolves
        assert_eq!(target(map.get_member("STAMP")), Some(("stamp", false)));
    }

    #[test]
    fn test_empty_column_never_resolves() {
        let shape = ctor_shape();
        let map = TypeMap::new(widget_shape());
        assert!(map.get_member("").is_none());
        assert!(map.get_constructor_parameter(&shape.constructors()[1], "").is_none());
    }

    #[test]
    fn test_concurrent_lookups_agree() {
        let shape = leak(
            Shape::new::<Widget>("Widget")
                .with_member(MemberDef::property("Name", text()))
                .with_member(MemberDef::property("Id", int()).read_only())
                .with_member(MemberDef::field("<Id>k__BackingField", int()))
                .with_constructor(ConstructorDef::new(Visibility::Private, vec![]))
                .with_constructor(ConstructorDef::public(vec![
                    ParamDef::new("id", int()),
                    ParamDef::new("name", text()),
                ])),
        );
        let map = TypeMap::new(shape);

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        let ctor = map
                            .find_constructor(&["Id", "Name"], &[SqlType::I32, SqlType::Text])
                            .map(|c| c.index());
                        let id = target(map.get_member("id"));
                        let name = target(map.get_member("Name"));
                        (ctor, id, name)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for result in &results {
            assert_eq!(
                *result,
                (
                    Some(1),
                    Some(("<Id>k__BackingField", false)),
                    Some(("Name", true))
                )
            );
        }
    }
}

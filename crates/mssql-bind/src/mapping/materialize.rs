//! Row materialization through a type map.

use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::core::{BindableType, ConstructorDef, SqlType, SqlValue};
use crate::error::{BindError, Result};

use super::member::BindingTarget;
use super::type_map::TypeMap;

/// Name and type of a result-set column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: SqlType,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ColumnPlan {
    Argument(usize),
    Member(&'static str),
    Skip,
}

/// Builds values of `T` from the rows of one result set.
///
/// The constructor and per-column targets are resolved once, when the mapper
/// is created.
pub struct RowMapper<T> {
    type_map: Arc<TypeMap>,
    constructor: &'static ConstructorDef,
    plan: Vec<ColumnPlan>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: BindableType> RowMapper<T> {
    pub fn new(type_map: Arc<TypeMap>, columns: &[ColumnInfo]) -> Result<Self> {
        let shape = type_map.shape();
        if shape.type_id() != TypeId::of::<T>() {
            return Err(BindError::Config(format!(
                "type map for {} cannot materialize {}",
                shape.type_name(),
                std::any::type_name::<T>()
            )));
        }

        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let types: Vec<SqlType> = columns.iter().map(|c| c.sql_type).collect();
        let constructor = type_map
            .find_explicit_constructor()
            .or_else(|| type_map.find_constructor(&names, &types))
            .ok_or_else(|| {
                BindError::Config(format!(
                    "no constructor of {} accepts columns ({})",
                    shape.type_name(),
                    columns
                        .iter()
                        .map(|c| format!("{} {}", c.name, c.sql_type.name()))
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;

        let plan = columns
            .iter()
            .map(|column| {
                if constructor.arity() > 0 {
                    let binding = type_map.get_constructor_parameter(constructor, &column.name);
                    if let Some(BindingTarget::ConstructorParameter { position, .. }) =
                        binding.map(|b| b.target())
                    {
                        return ColumnPlan::Argument(position);
                    }
                }
                match type_map.get_member(&column.name) {
                    Some(binding) => ColumnPlan::Member(binding.target_name()),
                    None => {
                        trace!(
                            type_name = shape.type_name(),
                            column = column.name.as_str(),
                            "skipping unmapped column"
                        );
                        ColumnPlan::Skip
                    }
                }
            })
            .collect();

        Ok(Self {
            type_map,
            constructor,
            plan,
            _marker: PhantomData,
        })
    }

    pub fn type_map(&self) -> &Arc<TypeMap> {
        &self.type_map
    }

    /// The constructor rows are built through.
    pub fn constructor(&self) -> &'static ConstructorDef {
        self.constructor
    }

    /// Build one value from a row laid out like the mapper's columns.
    pub fn map_row(&self, row: Vec<SqlValue<'static>>) -> Result<T> {
        if row.len() != self.plan.len() {
            return Err(BindError::mismatch(
                self.type_map.shape().type_name(),
                format!("row has {} values for {} columns", row.len(), self.plan.len()),
            ));
        }

        let mut args: Vec<SqlValue<'static>> = self
            .constructor
            .params
            .iter()
            .map(|p| SqlValue::Null(p.declared.storage_type().unwrap_or(SqlType::Text)))
            .collect();
        let mut assignments = Vec::new();
        for (plan, value) in self.plan.iter().zip(row) {
            match *plan {
                ColumnPlan::Argument(position) => args[position] = value,
                ColumnPlan::Member(name) => assignments.push((name, value)),
                ColumnPlan::Skip => {}
            }
        }

        let mut item = T::construct(self.constructor, args)?;
        for (name, value) in assignments {
            item.write(name, value)?;
        }
        Ok(item)
    }

    pub fn map_rows(&self, rows: Vec<Vec<SqlValue<'static>>>) -> Result<Vec<T>> {
        rows.into_iter().map(|row| self.map_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bindable, SqlEnum};
    use chrono::{DateTime, NaiveDate, Utc};

    #[derive(SqlEnum, Clone, Copy, Debug, PartialEq, Default)]
    enum Status {
        #[default]
        Draft,
        Published = 5,
    }

    #[derive(Bindable, Default, Debug)]
    struct Post {
        #[bind(name = "Id")]
        id: i32,
        #[bind(name = "Title")]
        title: String,
        #[bind(name = "Status")]
        status: Status,
        #[bind(name = "Published")]
        published: Option<DateTime<Utc>>,
        #[bind(name = "Views", readonly)]
        views: i64,
    }

    #[derive(Bindable, Debug)]
    #[bind(constructor(id = "Id", title = "Title"))]
    struct Summary {
        #[bind(name = "Id")]
        id: i32,
        #[bind(name = "Title")]
        title: String,
        #[bind(name = "Note")]
        note: Option<String>,
    }

    #[derive(Bindable, Default, Debug)]
    struct Frozen {
        #[bind(name = "Id")]
        id: i32,
        #[bind(name = "_stamp", field, readonly)]
        stamp: i64,
    }

    fn columns(layout: &[(&str, SqlType)]) -> Vec<ColumnInfo> {
        layout.iter().map(|(n, t)| ColumnInfo::new(*n, *t)).collect()
    }

    #[test]
    fn test_default_constructor_assigns_members() {
        let map = Arc::new(TypeMap::for_type::<Post>());
        let cols = columns(&[
            ("id", SqlType::I32),
            ("TITLE", SqlType::Text),
            ("Status", SqlType::I32),
            ("Published", SqlType::DateTime),
            ("Views", SqlType::I64),
            ("Unknown", SqlType::Bytes),
        ]);
        let mapper = RowMapper::<Post>::new(map, &cols).unwrap();
        assert_eq!(mapper.constructor().arity(), 0);

        let when = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        let post = mapper
            .map_row(vec![
                SqlValue::I32(7),
                SqlValue::from("hello"),
                SqlValue::I32(5),
                SqlValue::DateTime(when),
                SqlValue::I64(99),
                SqlValue::Bytes(vec![1u8].into()),
            ])
            .unwrap();

        assert_eq!(post.id, 7);
        assert_eq!(post.title, "hello");
        assert_eq!(post.status, Status::Published);
        assert_eq!(post.published.map(|p| p.naive_utc()), Some(when));
        assert_eq!(post.views, 99);
    }

    #[test]
    fn test_enum_column_accepts_label() {
        let map = Arc::new(TypeMap::for_type::<Post>());
        let mapper = RowMapper::<Post>::new(map, &columns(&[("Status", SqlType::Text)])).unwrap();
        let post = mapper.map_row(vec![SqlValue::from("published")]).unwrap();
        assert_eq!(post.status, Status::Published);
    }

    #[test]
    fn test_null_into_non_nullable_fails() {
        let map = Arc::new(TypeMap::for_type::<Post>());
        let mapper = RowMapper::<Post>::new(map, &columns(&[("Id", SqlType::I32)])).unwrap();
        let err = mapper.map_row(vec![SqlValue::Null(SqlType::I32)]).unwrap_err();
        assert!(matches!(err, BindError::Conversion { .. }));
    }

    #[test]
    fn test_constructor_with_leftover_member() {
        let map = Arc::new(TypeMap::for_type::<Summary>());
        let cols = columns(&[("Id", SqlType::I32), ("Title", SqlType::Text)]);
        let mapper = RowMapper::<Summary>::new(Arc::clone(&map), &cols).unwrap();
        assert_eq!(mapper.constructor().arity(), 2);
        let rows = mapper
            .map_rows(vec![
                vec![SqlValue::I32(1), SqlValue::from("one")],
                vec![SqlValue::I32(2), SqlValue::from("two")],
            ])
            .unwrap();
        assert_eq!(rows[1].id, 2);
        assert_eq!(rows[1].title, "two");
        assert_eq!(rows[1].note, None);
    }

    #[test]
    fn test_no_constructor_is_config_error() {
        let map = Arc::new(TypeMap::for_type::<Summary>());
        let cols = columns(&[("Id", SqlType::I64), ("Title", SqlType::Text)]);
        let err = RowMapper::<Summary>::new(map, &cols).err().unwrap();
        assert!(err.to_string().contains("Summary"));
    }

    #[test]
    fn test_read_only_field_column_is_skipped() {
        let map = Arc::new(TypeMap::for_type::<Frozen>());
        let cols = columns(&[("Id", SqlType::I32), ("_stamp", SqlType::I64)]);
        let mapper = RowMapper::<Frozen>::new(map, &cols).unwrap();
        let frozen = mapper.map_row(vec![SqlValue::I32(4), SqlValue::I64(77)]).unwrap();
        assert_eq!(frozen.id, 4);
        assert_eq!(frozen.stamp, 0);
    }

    #[test]
    fn test_row_width_mismatch() {
        let map = Arc::new(TypeMap::for_type::<Post>());
        let mapper = RowMapper::<Post>::new(map, &columns(&[("Id", SqlType::I32)])).unwrap();
        assert!(mapper.map_row(vec![]).is_err());
    }

    #[test]
    fn test_wrong_type_map_rejected() {
        let map = Arc::new(TypeMap::for_type::<Summary>());
        assert!(RowMapper::<Post>::new(map, &[]).is_err());
    }
}

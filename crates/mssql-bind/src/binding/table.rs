//! Expansion of record collections into table values.
//!
//! The first record's shape fixes the schema: one column per bindable
//! member, in declaration order, typed by the member's declared type with
//! the nullable wrapper stripped. Every record then contributes one row.

use tracing::trace;

use crate::binding::coerce;
use crate::binding::inspect;
use crate::binding::params::BoundValue;
use crate::core::{Bindable, SqlType, SqlValue};
use crate::error::{BindError, Result};

/// Column of a table value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub sql_type: SqlType,
}

/// A table value: schema plus rows of owned values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularValue {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<SqlValue<'static>>>,
}

impl TabularValue {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Expand a record collection into a table value.
///
/// Returns `Ok(None)` when the collection is absent or empty. Every record
/// must share the first record's type.
pub fn expand(parameter: &str, records: Option<&[&dyn Bindable]>) -> Result<Option<TabularValue>> {
    let records = match records {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(None),
    };

    let first = records[0].shape();
    let members = inspect::bindable(first);

    let mut columns = Vec::with_capacity(members.len());
    for m in &members {
        let sql_type = m.declared.underlying().storage_type().ok_or_else(|| {
            BindError::Config(format!(
                "table parameter '{}': member {}.{} is itself a collection",
                parameter,
                first.type_name(),
                m.member_name
            ))
        })?;
        columns.push(TableColumn {
            name: m.bound_name.to_string(),
            sql_type,
        });
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let shape = record.shape();
        if shape.type_id() != first.type_id() {
            return Err(BindError::mismatch(
                parameter,
                format!(
                    "record {} is a {} but the table was laid out for {}",
                    i,
                    shape.type_name(),
                    first.type_name()
                ),
            ));
        }

        let mut row = Vec::with_capacity(columns.len());
        for (m, column) in members.iter().zip(&columns) {
            let value = match record.read(m.member_name) {
                None => SqlValue::Null(column.sql_type),
                Some(raw) => match coerce::coerce_member(raw).map_err(|e| {
                    BindError::conversion(format!("{}.{}", parameter, m.bound_name), e)
                })? {
                    BoundValue::Scalar(v) if v.is_null() => SqlValue::Null(column.sql_type),
                    BoundValue::Scalar(v) => v.into_owned(),
                    BoundValue::Records(_) => {
                        return Err(BindError::mismatch(
                            parameter,
                            format!("column '{}' produced a nested collection", column.name),
                        ))
                    }
                },
            };
            row.push(value);
        }
        rows.push(row);
    }

    trace!(
        parameter,
        columns = columns.len(),
        rows = rows.len(),
        "expanded table value"
    );
    Ok(Some(TabularValue { columns, rows }))
}

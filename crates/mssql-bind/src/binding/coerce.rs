//! Value coercion applied before values reach the executor.
//!
//! - Booleans travel as the integers 1 and 0.
//! - Enumerations travel as their label text.
//! - Zone-less timestamps are wrapped in [`SqlDateTime`].
//!
//! Everything else passes through unchanged.

use std::borrow::Cow;

use crate::binding::datetime::SqlDateTime;
use crate::binding::params::BoundValue;
use crate::core::{EnumValue, MemberValue, SqlType, SqlValue};
use crate::error::ConvertError;

/// Size hint for text parameters: the maximum (`nvarchar(max)`).
pub const SIZE_MAX: i32 = -1;

pub fn bool_to_sql(value: bool) -> SqlValue<'static> {
    SqlValue::I32(i32::from(value))
}

/// Read a boolean back from its integer, bit or text form.
pub fn bool_from_sql(value: &SqlValue<'_>) -> Result<bool, ConvertError> {
    match value {
        SqlValue::Bool(b) => Ok(*b),
        SqlValue::Text(t) => match t.trim() {
            s if s.eq_ignore_ascii_case("true") || s == "1" => Ok(true),
            s if s.eq_ignore_ascii_case("false") || s == "0" => Ok(false),
            s => Err(ConvertError::OutOfRange {
                expected: "bool",
                value: s.to_string(),
            }),
        },
        SqlValue::Null(_) => Err(ConvertError::UnexpectedNull { expected: "bool" }),
        other => match other.as_i64() {
            Some(n) => Ok(n != 0),
            None => Err(ConvertError::TypeMismatch {
                expected: "bool",
                found: other.sql_type(),
            }),
        },
    }
}

pub fn enum_to_sql(value: EnumValue) -> SqlValue<'static> {
    SqlValue::Text(Cow::Borrowed(value.label))
}

/// Coerce one scalar to the form the executor receives.
pub fn coerce_scalar(value: SqlValue<'_>) -> Result<SqlValue<'_>, ConvertError> {
    match value {
        SqlValue::Bool(b) => Ok(bool_to_sql(b)),
        SqlValue::Null(SqlType::Bool) => Ok(SqlValue::Null(SqlType::I32)),
        SqlValue::DateTime(n) => Ok(SqlDateTime::new(n)?.into()),
        other => Ok(other),
    }
}

/// Coerce a member value; record collections pass through for table expansion.
pub fn coerce_member(value: MemberValue<'_>) -> Result<BoundValue<'_>, ConvertError> {
    match value {
        MemberValue::Scalar(v) => coerce_scalar(v).map(BoundValue::Scalar),
        MemberValue::Enum(e) => Ok(BoundValue::Scalar(enum_to_sql(e))),
        MemberValue::Records(records) => Ok(BoundValue::Records(records)),
    }
}

/// Size hint the executor should declare for a parameter value.
pub fn size_hint(value: &SqlValue<'_>) -> Option<i32> {
    match value.sql_type() {
        SqlType::Text => Some(SIZE_MAX),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EnumInfo;
    use chrono::NaiveDate;

    static LEVEL: EnumInfo = EnumInfo {
        name: "Level",
        underlying: SqlType::I32,
        variants: &[("Low", 0), ("High", 10)],
    };

    #[test]
    fn test_bool_travels_as_int() {
        assert_eq!(coerce_scalar(SqlValue::Bool(true)).unwrap(), SqlValue::I32(1));
        assert_eq!(coerce_scalar(SqlValue::Bool(false)).unwrap(), SqlValue::I32(0));
        assert_eq!(
            coerce_scalar(SqlValue::Null(SqlType::Bool)).unwrap(),
            SqlValue::Null(SqlType::I32)
        );
    }

    #[test]
    fn test_bool_from_sql_forms() {
        assert_eq!(bool_from_sql(&SqlValue::I32(1)), Ok(true));
        assert_eq!(bool_from_sql(&SqlValue::I64(0)), Ok(false));
        assert_eq!(bool_from_sql(&SqlValue::U8(2)), Ok(true));
        assert_eq!(bool_from_sql(&SqlValue::Bool(false)), Ok(false));
        assert_eq!(bool_from_sql(&SqlValue::from("True")), Ok(true));
        assert!(bool_from_sql(&SqlValue::from("maybe")).is_err());
        assert!(bool_from_sql(&SqlValue::F64(1.0)).is_err());
    }

    #[test]
    fn test_enum_travels_as_label() {
        let value = EnumValue {
            info: &LEVEL,
            label: "High",
            ordinal: 10,
        };
        match coerce_member(MemberValue::Enum(value)).unwrap() {
            BoundValue::Scalar(v) => assert_eq!(v, SqlValue::from("High")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_datetime_is_wrapped() {
        let t = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(8, 0, 0, 1)
            .unwrap();
        let coerced = coerce_scalar(SqlValue::DateTime(t)).unwrap();
        assert_eq!(
            coerced,
            SqlValue::DateTime(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap()
            )
        );

        let ancient = NaiveDate::from_ymd_opt(1600, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert!(matches!(
            coerce_scalar(SqlValue::DateTime(ancient)),
            Err(ConvertError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_other_values_pass_through() {
        assert_eq!(coerce_scalar(SqlValue::I64(9)).unwrap(), SqlValue::I64(9));
        assert_eq!(
            coerce_scalar(SqlValue::Null(SqlType::Text)).unwrap(),
            SqlValue::Null(SqlType::Text)
        );
    }

    #[test]
    fn test_text_size_hint_is_max() {
        assert_eq!(size_hint(&SqlValue::from("x")), Some(SIZE_MAX));
        assert_eq!(size_hint(&SqlValue::Null(SqlType::Text)), Some(SIZE_MAX));
        assert_eq!(size_hint(&SqlValue::I32(1)), None);
    }
}

//! [`SqlField`] implementations for the supported member types.
//!
//! Reading converts a member into a [`MemberValue`]; writing accepts any
//! [`SqlValue`] the member can faithfully hold. Integer slots accept any
//! integer that fits, booleans accept integers and `"true"`/`"false"` text,
//! and `DateTime<Utc>` slots normalize whatever they receive to UTC.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::binding::{coerce, datetime};
use crate::error::ConvertError;

use super::shape::{MemberValue, SqlEnum, SqlField};
use super::types::DeclaredType;
use super::value::{SqlType, SqlValue};

fn mismatch(expected: &'static str, value: &SqlValue<'_>) -> ConvertError {
    match value {
        SqlValue::Null(_) => ConvertError::UnexpectedNull { expected },
        other => ConvertError::TypeMismatch {
            expected,
            found: other.sql_type(),
        },
    }
}

macro_rules! integer_field {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl SqlField for $ty {
            fn declared_type() -> DeclaredType {
                DeclaredType::scalar(SqlType::$variant)
            }

            fn to_member_value(&self) -> MemberValue<'_> {
                MemberValue::Scalar(SqlValue::$variant(*self))
            }

            fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
                if let SqlValue::Bool(b) = value {
                    return Ok(<$ty>::from(b));
                }
                let wide = value.as_i64().ok_or_else(|| mismatch($name, &value))?;
                <$ty>::try_from(wide).map_err(|_| ConvertError::OutOfRange {
                    expected: $name,
                    value: wide.to_string(),
                })
            }
        }
    };
}

integer_field!(u8, U8, "tinyint");
integer_field!(i16, I16, "smallint");
integer_field!(i32, I32, "int");
integer_field!(i64, I64, "bigint");

impl SqlField for bool {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::Bool)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::Bool(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        coerce::bool_from_sql(&value)
    }
}

impl SqlField for f64 {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::F64)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::F64(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::F64(v) => Ok(v),
            SqlValue::F32(v) => Ok(f64::from(v)),
            SqlValue::Decimal(d) => d.to_f64().ok_or_else(|| ConvertError::OutOfRange {
                expected: "float",
                value: d.to_string(),
            }),
            ref other => other
                .as_i64()
                .map(|n| n as f64)
                .ok_or_else(|| mismatch("float", other)),
        }
    }
}

impl SqlField for f32 {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::F32)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::F32(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::F32(v) => Ok(v),
            SqlValue::F64(v) => Ok(v as f32),
            ref other => other
                .as_i64()
                .map(|n| n as f32)
                .ok_or_else(|| mismatch("real", other)),
        }
    }
}

impl SqlField for Decimal {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::Decimal)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::Decimal(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::Decimal(d) => Ok(d),
            SqlValue::F64(v) => Decimal::from_f64(v).ok_or_else(|| ConvertError::OutOfRange {
                expected: "decimal",
                value: v.to_string(),
            }),
            ref other => other
                .as_i64()
                .map(Decimal::from)
                .ok_or_else(|| mismatch("decimal", other)),
        }
    }
}

impl SqlField for String {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::Text)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::Text(Cow::Borrowed(self.as_str())))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::Text(t) => Ok(t.into_owned()),
            SqlValue::Uuid(u) => Ok(u.to_string()),
            ref other => Err(mismatch("nvarchar", other)),
        }
    }
}

impl SqlField for char {
    fn declared_type() -> DeclaredType {
        DeclaredType::char()
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::text_owned(self.to_string()))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::Text(t) => {
                let mut chars = t.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(ConvertError::OutOfRange {
                        expected: "char",
                        value: t.into_owned(),
                    }),
                }
            }
            ref other => Err(mismatch("char", other)),
        }
    }
}

impl SqlField for Vec<u8> {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::Bytes)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::bytes_borrowed(self.as_slice()))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::Bytes(b) => Ok(b.into_owned()),
            ref other => Err(mismatch("varbinary", other)),
        }
    }
}

impl SqlField for Uuid {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::Uuid)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::Uuid(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::Uuid(u) => Ok(u),
            SqlValue::Text(t) => Uuid::parse_str(&t).map_err(|_| ConvertError::OutOfRange {
                expected: "uniqueidentifier",
                value: t.into_owned(),
            }),
            ref other => Err(mismatch("uniqueidentifier", other)),
        }
    }
}

impl SqlField for NaiveDateTime {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::DateTime)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::DateTime(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        datetime::parse_utc(&value).map(|dt| dt.naive_utc())
    }
}

impl SqlField for DateTime<Utc> {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::DateTime)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::DateTime(self.naive_utc()))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        datetime::parse_utc(&value)
    }
}

impl SqlField for DateTime<FixedOffset> {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::DateTimeOffset)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::DateTimeOffset(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::DateTimeOffset(dt) => Ok(dt),
            SqlValue::DateTime(n) => Ok(n.and_utc().fixed_offset()),
            ref other => Err(mismatch("datetimeoffset", other)),
        }
    }
}

impl SqlField for NaiveDate {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::Date)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::Date(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::Date(d) => Ok(d),
            SqlValue::DateTime(n) => Ok(n.date()),
            ref other => Err(mismatch("date", other)),
        }
    }
}

impl SqlField for NaiveTime {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar(SqlType::Time)
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        MemberValue::Scalar(SqlValue::Time(*self))
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        match value {
            SqlValue::Time(t) => Ok(t),
            SqlValue::DateTime(n) => Ok(n.time()),
            ref other => Err(mismatch("time", other)),
        }
    }
}

impl<T: SqlField> SqlField for Option<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type().nullable()
    }

    fn to_member_value(&self) -> MemberValue<'_> {
        match self {
            Some(v) => v.to_member_value(),
            None => MemberValue::Scalar(SqlValue::Null(
                T::declared_type().storage_type().unwrap_or(SqlType::Text),
            )),
        }
    }

    fn from_sql(value: SqlValue<'_>) -> Result<Self, ConvertError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_sql(value).map(Some)
        }
    }
}

/// Read an enumeration from either its label or its ordinal.
///
/// Used by `#[derive(SqlEnum)]`.
pub fn enum_from_sql<E: SqlEnum>(value: SqlValue<'_>) -> Result<E, ConvertError> {
    let info = E::enum_info();
    let found = match &value {
        SqlValue::Text(label) => E::from_label(label.trim()),
        other => match other.as_i64() {
            Some(ordinal) => E::from_ordinal(ordinal),
            None => return Err(mismatch(info.name, other)),
        },
    };
    found.ok_or_else(|| ConvertError::UnknownVariant {
        enum_name: info.name,
        value: match value {
            SqlValue::Text(t) => t.into_owned(),
            other => other.as_i64().map(|o| o.to_string()).unwrap_or_default(),
        },
    })
}

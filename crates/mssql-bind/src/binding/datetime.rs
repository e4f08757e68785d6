//! Date/time handling at the binding boundary.
//!
//! Values read back are always tagged UTC: a zone-less `datetime` is taken to
//! already be UTC, and a `datetimeoffset` is converted. Values written are
//! wrapped in [`SqlDateTime`], which has the range and precision of the SQL
//! Server `datetime` type.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

use crate::core::SqlValue;
use crate::error::ConvertError;

/// `datetime` time-of-day ticks per second.
const TICKS_PER_SECOND: i64 = 300;
const TICKS_PER_DAY: i64 = TICKS_PER_SECOND * 86_400;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Tag a zone-less timestamp as UTC without shifting the instant.
pub fn normalize_utc(value: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&value)
}

/// Read a UTC timestamp from a row or parameter value.
pub fn parse_utc(value: &SqlValue<'_>) -> Result<DateTime<Utc>, ConvertError> {
    match value {
        SqlValue::DateTime(n) => Ok(normalize_utc(*n)),
        SqlValue::DateTimeOffset(dt) => Ok(dt.with_timezone(&Utc)),
        SqlValue::Date(d) => Ok(normalize_utc(d.and_time(NaiveTime::MIN))),
        SqlValue::Null(_) => Err(ConvertError::UnexpectedNull {
            expected: "datetime",
        }),
        other => Err(ConvertError::TypeMismatch {
            expected: "datetime",
            found: other.sql_type(),
        }),
    }
}

/// A timestamp in the SQL Server `datetime` domain.
///
/// Dates run from 1753-01-01 to 9999-12-31 and the time of day is held in
/// 1/300 second ticks, so construction rounds to the nearest tick and the
/// value reads back at millisecond resolution (`.001` becomes `.000`, `.002`
/// becomes `.003`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SqlDateTime {
    value: NaiveDateTime,
}

impl SqlDateTime {
    pub fn min_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1753, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn max_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
    }

    pub fn new(value: NaiveDateTime) -> Result<Self, ConvertError> {
        let out_of_range = || ConvertError::OutOfRange {
            expected: "datetime",
            value: value.to_string(),
        };

        let mut date = value.date();
        if date < Self::min_date() || date > Self::max_date() {
            return Err(out_of_range());
        }

        let time = value.time();
        // Leap-second representations carry nanoseconds >= 1e9.
        let nanos = i64::from(time.nanosecond()).min(NANOS_PER_SECOND - 1);
        let nanos_of_day = i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND + nanos;

        let mut ticks = (nanos_of_day * 3 + 5_000_000) / 10_000_000;
        if ticks >= TICKS_PER_DAY {
            ticks = 0;
            date = date.succ_opt().ok_or_else(out_of_range)?;
            if date > Self::max_date() {
                return Err(out_of_range());
            }
        }

        let millis = (ticks * 20 + 3) / 6;
        let value = date.and_time(NaiveTime::MIN) + Duration::milliseconds(millis);
        Ok(Self { value })
    }

    /// The rounded timestamp.
    pub fn value(&self) -> NaiveDateTime {
        self.value
    }
}

impl TryFrom<NaiveDateTime> for SqlDateTime {
    type Error = ConvertError;

    fn try_from(value: NaiveDateTime) -> Result<Self, Self::Error> {
        SqlDateTime::new(value)
    }
}

impl From<SqlDateTime> for SqlValue<'static> {
    fn from(v: SqlDateTime) -> Self {
        SqlValue::DateTime(v.value)
    }
}

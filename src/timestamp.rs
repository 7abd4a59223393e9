//! Conversions between timestamps, their database representation and the
//! date strings accepted from clients.
//!
//! Timestamps are stored as integer milliseconds since the Unix epoch in UTC
//! so that date range predicates compare numerically.

use rusqlite::{Row, types::Type};
use time::{
    OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::Error;

/// Convert `date_time` to milliseconds since the Unix epoch.
pub fn to_millis(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Convert milliseconds since the Unix epoch to a UTC date time.
///
/// # Errors
/// Returns [Error::InvalidTimestamp] if `millis` is outside the supported range.
pub fn from_millis(millis: i64) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|error| Error::InvalidTimestamp(error.to_string()))
}

/// The current time in UTC, at the millisecond precision used for storage.
pub fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.replace_nanosecond(now.millisecond() as u32 * 1_000_000)
        .unwrap_or(now)
}

/// Read the millisecond timestamp in column `index` of `row`.
pub fn get_timestamp(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    let millis: i64 = row.get(index)?;

    from_millis(millis).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}

/// Parse an RFC 3339 timestamp such as "2025-10-27T09:30:00Z" and convert it to UTC.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid RFC 3339 timestamp.
pub fn parse_timestamp(text: &str) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(text.trim(), &Rfc3339)
        .map(|date_time| date_time.to_offset(time::UtcOffset::UTC))
        .map_err(|_| Error::InvalidDate)
}

/// Parse either a calendar date ("2025-10-27", taken as midnight UTC) or an
/// RFC 3339 timestamp.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is neither.
pub fn parse_date_or_timestamp(text: &str) -> Result<OffsetDateTime, Error> {
    let text = text.trim();

    match time::Date::parse(text, format_description!("[year]-[month]-[day]")) {
        Ok(date) => Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc()),
        Err(_) => parse_timestamp(text),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::Error;

    use super::{from_millis, parse_date_or_timestamp, parse_timestamp, to_millis};

    #[test]
    fn millis_round_trip_keeps_milliseconds() {
        let date_time = datetime!(2025-10-27 09:30:15.123 UTC);

        let got = from_millis(to_millis(date_time)).unwrap();

        assert_eq!(got, date_time);
    }

    #[test]
    fn parse_timestamp_converts_to_utc() {
        let got = parse_timestamp("2025-10-27T12:00:00+13:00").unwrap();

        assert_eq!(got, datetime!(2025-10-26 23:00:00 UTC));
    }

    #[test]
    fn parse_timestamp_rejects_date_only() {
        assert_eq!(parse_timestamp("2025-10-27"), Err(Error::InvalidDate));
    }

    #[test]
    fn parse_date_is_midnight_utc() {
        let got = parse_date_or_timestamp("2025-10-27").unwrap();

        assert_eq!(got, datetime!(2025-10-27 00:00:00 UTC));
    }

    #[test]
    fn parse_date_accepts_timestamps() {
        let got = parse_date_or_timestamp("2025-10-27T08:00:00Z").unwrap();

        assert_eq!(got, datetime!(2025-10-27 08:00:00 UTC));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date_or_timestamp("last tuesday"), Err(Error::InvalidDate));
    }
}

//! Parsing and serde helpers for the wire formats used by booking widgets.
//!
//! Times are wall-clock `HH:mm:ss` strings (`HH:mm` is accepted on input),
//! dates are ISO `YYYY-MM-DD`, months are `YYYY-MM`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Result, SlotError};

/// Output format for wall-clock times.
pub const TIME_FORMAT: &str = "%H:%M:%S";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an `HH:mm:ss` (or `HH:mm`) string into a [`NaiveTime`].
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| SlotError::InvalidTime(s.to_string()))
}

/// Parse a `YYYY-MM-DD` string into a [`NaiveDate`].
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| SlotError::InvalidDate(s.to_string()))
}

/// Parse a month into the first day of that month.
///
/// Accepts `YYYY-MM` as well as a full `YYYY-MM-DD` date, in which case the
/// day component is dropped.
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let date = NaiveDate::parse_from_str(&format!("{}-01", trimmed), DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, DATE_FORMAT))
        .map_err(|_| SlotError::InvalidMonth(s.to_string()))?;
    Ok(first_of_month(date))
}

/// Parse a local `YYYY-MM-DDTHH:mm:ss` timestamp (seconds optional).
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let trimmed = s.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| SlotError::InvalidDateTime(s.to_string()))
}

/// First calendar day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.day0()))
}

/// Last calendar day of the month containing `date`.
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .last()
        .unwrap_or(first)
}

/// Serde adapter for `NaiveTime` fields stored as `HH:mm:ss`.
pub mod serde_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(super::TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(de::Error::custom)
    }
}

pub mod anomalies;
pub mod forecast;
pub mod import;
pub mod recurring;
pub mod report;
pub mod setup;
pub mod stats;
pub mod ui;

use crate::core::period::TimePeriod;
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

/// Short label for the period starting at `start`, e.g. `2024-03`,
/// `2024-Q1` or `2024`.
pub fn period_label(start: &DateTime<Utc>, period: TimePeriod) -> String {
    match period {
        TimePeriod::Month => start.format("%Y-%m").to_string(),
        TimePeriod::Quarter => format!("{}-Q{}", start.year(), start.month0() / 3 + 1),
        TimePeriod::Year => start.year().to_string(),
    }
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date. A plain
/// date means the start of that day, or its last instant when `end_of_day`
/// is set.
pub fn parse_date(value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{value}', expected YYYY-MM-DD or RFC 3339"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
    } else {
        NaiveTime::MIN
    };
    Ok(date.and_time(time).and_utc())
}

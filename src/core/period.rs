//! Period granularity and the calendar arithmetic built on it.
//!
//! All functions preserve the time zone of their input: a period that starts
//! in `+03:00` is truncated, shifted and closed in `+03:00`.

use anyhow::anyhow;
use chrono::{
    DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Calendar bucket used to group transactions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimePeriod {
    #[default]
    Month,
    Quarter,
    Year,
}

impl Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TimePeriod::Month => "MONTH",
                TimePeriod::Quarter => "QUARTER",
                TimePeriod::Year => "YEAR",
            }
        )
    }
}

impl FromStr for TimePeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        match normalized.trim_start_matches("TIME_PERIOD_") {
            "MONTH" | "M" => Ok(TimePeriod::Month),
            "QUARTER" | "Q" => Ok(TimePeriod::Quarter),
            "YEAR" | "Y" => Ok(TimePeriod::Year),
            _ => Err(anyhow!("Invalid time period: {}", s)),
        }
    }
}

impl TimePeriod {
    /// Parses user input, falling back to [`TimePeriod::Month`] when the
    /// value is absent or not recognized.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Length of one period in calendar months.
    pub fn months(self) -> i32 {
        match self {
            TimePeriod::Month => 1,
            TimePeriod::Quarter => 3,
            TimePeriod::Year => 12,
        }
    }
}

/// Returns the first instant of the period containing `instant`.
///
/// Quarters start in January, April, July and October.
pub fn truncate_to_period_start<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    period: TimePeriod,
) -> DateTime<Tz> {
    let date = instant.date_naive();
    let month = match period {
        TimePeriod::Month => date.month(),
        TimePeriod::Quarter => ((date.month() - 1) / 3) * 3 + 1,
        TimePeriod::Year => 1,
    };
    // Day 1 of a month taken from an existing date is always representable.
    let first_day = NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date);
    localize(&instant.timezone(), first_day.and_time(NaiveTime::default()))
}

/// Shifts `start` by `n` whole periods. Negative `n` moves backwards.
///
/// Day-of-month overflow clamps to the last day of the target month, and
/// results outside chrono's representable range saturate at its bounds.
pub fn add_periods<Tz: TimeZone>(start: &DateTime<Tz>, period: TimePeriod, n: i32) -> DateTime<Tz> {
    let months = period.months().saturating_mul(n);
    let naive = start.naive_local();
    let shifted = if months >= 0 {
        naive
            .checked_add_months(Months::new(months.unsigned_abs()))
            .unwrap_or(NaiveDateTime::MAX)
    } else {
        naive
            .checked_sub_months(Months::new(months.unsigned_abs()))
            .unwrap_or(NaiveDateTime::MIN)
    };
    localize(&start.timezone(), shifted)
}

/// Returns the instant immediately preceding the next period's start.
pub fn period_end<Tz: TimeZone>(start: &DateTime<Tz>, period: TimePeriod) -> DateTime<Tz> {
    let next = add_periods(start, period, 1);
    next.clone()
        .checked_sub_signed(TimeDelta::nanoseconds(1))
        .unwrap_or(next)
}

fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    // Local midnight can fall into a DST gap; the UTC reading keeps the result total.
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

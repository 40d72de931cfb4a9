use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar unit a time group cycles over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monday of the calendar week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the calendar month containing `date`.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Number of calendar boundaries of `unit` crossed going from `from` to `to`.
///
/// Boundaries are counted on the calendar, not by dividing elapsed time:
/// 2024-01-31 to 2024-02-01 crosses one month boundary, and a Sunday to the
/// following Monday crosses one week boundary. Negative when `to` precedes `from`.
pub fn boundaries_between(from: NaiveDate, to: NaiveDate, unit: Granularity) -> i64 {
    match unit {
        Granularity::Day => (to - from).num_days(),
        Granularity::Week => (start_of_week(to) - start_of_week(from)).num_days() / 7,
        Granularity::Month => {
            let years = (to.year() - from.year()) as i64;
            years * 12 + to.month() as i64 - from.month() as i64
        }
        Granularity::Year => (to.year() - from.year()) as i64,
    }
}

/// 1-based count of `unit` periods from `anchor` up to and including `target`.
///
/// The anchor's own period is period 1.
pub fn periods_elapsed(anchor: NaiveDate, target: NaiveDate, unit: Granularity) -> i64 {
    boundaries_between(anchor, target, unit) + 1
}

/// Position of `target` inside a repeating cycle of `cycle` periods that
/// starts at `anchor`. Returns `None` for an empty cycle.
pub fn cycle_index(
    anchor: NaiveDate,
    target: NaiveDate,
    unit: Granularity,
    cycle: u32,
) -> Option<usize> {
    if cycle == 0 {
        return None;
    }
    let periods = periods_elapsed(anchor, target, unit);
    Some((periods - 1).rem_euclid(cycle as i64) as usize)
}

/// Weekday position with Monday as 0 and Sunday as 6.
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// Day-of-month position with the 1st as 0.
pub fn month_day_index(date: NaiveDate) -> usize {
    date.day0() as usize
}

/// Applies the hour and minute of `time` to `date`; seconds and sub-seconds are dropped.
pub fn at_time_of_day(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    let trimmed = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(NaiveTime::MIN);
    date.and_time(trimmed)
}

/// Start of the day following `now`.
pub fn next_midnight(now: NaiveDateTime) -> NaiveDateTime {
    let tomorrow = now.date().succ_opt().unwrap_or(now.date());
    tomorrow.and_time(NaiveTime::MIN)
}

/// Real time between two wall-clock readings in `tz`, so a day that loses an
/// hour to daylight saving lasts 23 hours. A reading inside a skipped hour
/// falls back to the plain wall-clock difference.
pub fn elapsed_in<Tz: TimeZone>(tz: &Tz, from: NaiveDateTime, to: NaiveDateTime) -> Duration {
    match (
        tz.from_local_datetime(&from).earliest(),
        tz.from_local_datetime(&to).earliest(),
    ) {
        (Some(from), Some(to)) => to.signed_duration_since(from),
        _ => to - from,
    }
}

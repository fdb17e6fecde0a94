//! Closed time intervals used to bucket todos and lists by date.
//!
//! Windows are computed in the caller's timezone (day/week/month views are
//! wall-clock concepts) and stored as epoch-millisecond bounds so they can be
//! compared directly against persisted timestamps.

use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// A closed interval `[start_ms, end_ms]` in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl Window {
    /// The day containing `reference`: 00:00:00.000 through 23:59:59.999.
    pub fn day_of<Tz: TimeZone>(reference: &DateTime<Tz>) -> Self {
        let date = reference.date_naive();
        Self::from_dates(&reference.timezone(), date, date)
    }

    /// The ISO week containing `reference`: Monday 00:00:00.000 through
    /// Sunday 23:59:59.999.
    pub fn week_of<Tz: TimeZone>(reference: &DateTime<Tz>) -> Self {
        let date = reference.date_naive();
        let monday = date
            .checked_sub_days(Days::new(date.weekday().num_days_from_monday() as u64))
            .unwrap_or(date);
        let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);
        Self::from_dates(&reference.timezone(), monday, sunday)
    }

    /// The calendar month containing `reference`: first day 00:00:00.000
    /// through last day 23:59:59.999.
    pub fn month_of<Tz: TimeZone>(reference: &DateTime<Tz>) -> Self {
        let date = reference.date_naive();
        let first = date.with_day(1).unwrap_or(date);
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|d| d.checked_sub_days(Days::new(1)))
            .unwrap_or(date);
        Self::from_dates(&reference.timezone(), first, last)
    }

    fn from_dates<Tz: TimeZone>(tz: &Tz, first: NaiveDate, last: NaiveDate) -> Self {
        let start = first.and_hms_opt(0, 0, 0).unwrap_or_default();
        let end = last.and_hms_milli_opt(23, 59, 59, 999).unwrap_or_default();
        Self {
            start_ms: local_ms(tz, start),
            end_ms: local_ms(tz, end),
        }
    }

    /// Closed-interval membership. `None` timestamps are in no window.
    pub fn contains(&self, ms: i64) -> bool {
        ms >= self.start_ms && ms <= self.end_ms
    }

    pub fn contains_opt(&self, ms: Option<i64>) -> bool {
        ms.map(|v| self.contains(v)).unwrap_or(false)
    }
}

/// Named window selection for the today/week/month views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Today,
    Week,
    Month,
}

impl WindowKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "today" => Some(WindowKind::Today),
            "week" => Some(WindowKind::Week),
            "month" => Some(WindowKind::Month),
            _ => None,
        }
    }

    pub fn window_of<Tz: TimeZone>(&self, reference: &DateTime<Tz>) -> Window {
        match self {
            WindowKind::Today => Window::day_of(reference),
            WindowKind::Week => Window::week_of(reference),
            WindowKind::Month => Window::month_of(reference),
        }
    }
}

/// Resolve a wall-clock datetime to epoch milliseconds in `tz`.
fn local_ms<Tz: TimeZone>(tz: &Tz, ndt: NaiveDateTime) -> i64 {
    match tz.from_local_datetime(&ndt) {
        LocalResult::Single(dt) => dt.timestamp_millis(),
        // DST fold: take the earlier instant.
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        // DST gap: the wall-clock time does not exist in tz.
        LocalResult::None => tz.from_utc_datetime(&ndt).timestamp_millis(),
    }
}

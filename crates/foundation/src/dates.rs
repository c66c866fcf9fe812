use std::fmt;

use chrono::{Days, NaiveDate, Utc};

/// Days between "today" and the newest date we ask imagery for.
///
/// The daily imagery is usually published with a lag; asking for today or
/// yesterday mostly yields empty tiles.
pub const DEFAULT_EMBARGO_DAYS: u32 = 2;

/// A UTC calendar day, rendered as `YYYY-MM-DD`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The day `days` before this one, `None` before the calendar's range.
    pub fn days_before(&self, days: u64) -> Option<Self> {
        self.0.checked_sub_days(Days::new(days)).map(Self)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Current calendar day in UTC.
pub fn utc_today() -> CalendarDate {
    CalendarDate(Utc::now().date_naive())
}

/// Ordered run of consecutive days, oldest first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DateSequence {
    dates: Vec<CalendarDate>,
}

impl DateSequence {
    /// `days` consecutive dates whose newest entry is `embargo_days` before
    /// `today`.
    ///
    /// With the default embargo of 2 this is `today - k` for `k` from
    /// `days + 1` down to `2`. `days == 0` gives an empty sequence.
    pub fn ending_before(today: CalendarDate, days: u32, embargo_days: u32) -> Self {
        let embargo = u64::from(embargo_days);
        let dates = (0..u64::from(days))
            .rev()
            .filter_map(|back| today.days_before(embargo + back))
            .collect();
        Self { dates }
    }

    /// Same as [`DateSequence::ending_before`] anchored on the current UTC day.
    pub fn last_days(days: u32, embargo_days: u32) -> Self {
        Self::ending_before(utc_today(), days, embargo_days)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn as_slice(&self) -> &[CalendarDate] {
        &self.dates
    }

    pub fn first(&self) -> Option<CalendarDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<CalendarDate> {
        self.dates.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarDate> {
        self.dates.iter()
    }
}

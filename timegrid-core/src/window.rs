//! Time-window resolution and navigation.
//!
//! A [`TimeWindow`] is the value everything else hangs off: the `[start,
//! end)` instant range events are fetched for, and the ordered list of
//! calendar days the view renders. It is recomputed whenever the anchor
//! date or granularity changes and never mutated in place.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::tz::DisplayTimezone;

/// Days rendered by the month grid: six full weeks.
const MONTH_GRID_DAYS: i64 = 42;

/// View granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    #[default]
    Week,
    Month,
}

impl Granularity {
    /// The anchor one step forward: 1 day, 7 days, or 1 calendar month.
    /// Month steps clamp the day-of-month (Jan 31 -> Feb 28).
    pub fn advance(self, anchor: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => anchor + Duration::days(1),
            Granularity::Week => anchor + Duration::days(7),
            Granularity::Month => anchor.checked_add_months(Months::new(1)).unwrap_or(anchor),
        }
    }

    /// The anchor one step backward.
    pub fn retreat(self, anchor: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => anchor - Duration::days(1),
            Granularity::Week => anchor - Duration::days(7),
            Granularity::Month => anchor.checked_sub_months(Months::new(1)).unwrap_or(anchor),
        }
    }
}

/// The resolved view window: a half-open instant range plus the ordered
/// calendar days it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub granularity: Granularity,
    pub days: Vec<NaiveDate>,
}

impl TimeWindow {
    /// Resolve the window for an anchor date and granularity.
    ///
    /// Day boundaries are taken in the display timezone current at
    /// resolution time; a later timezone change re-labels and re-buckets
    /// cached events but does not re-resolve the window until the next
    /// navigation.
    pub fn resolve(anchor: NaiveDate, granularity: Granularity, tz: &DisplayTimezone) -> Self {
        let days = match granularity {
            Granularity::Day => vec![anchor],
            Granularity::Week => {
                let monday = week_start(anchor);
                (0..7).map(|i| monday + Duration::days(i)).collect()
            }
            Granularity::Month => month_grid(anchor),
        };

        // days is non-empty for every granularity
        let first = days[0];
        let last = days[days.len() - 1];

        TimeWindow {
            start: tz.day_start_utc(first),
            end: tz.day_start_utc(last + Duration::days(1)),
            granularity,
            days,
        }
    }

    pub fn contains_day(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    /// First rendered day (for header display).
    pub fn first_day(&self) -> NaiveDate {
        self.days[0]
    }

    /// Last rendered day (for header display).
    pub fn last_day(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }
}

/// The Monday on or before `date` (ISO week start).
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday();
    date - Duration::days(i64::from(offset))
}

/// Six Monday-started weeks covering the anchor's month, leading and
/// trailing days included.
fn month_grid(anchor: NaiveDate) -> Vec<NaiveDate> {
    // Day 1 always exists
    let first_of_month = anchor.with_day(1).unwrap();
    let grid_start = week_start(first_of_month);
    (0..MONTH_GRID_DAYS)
        .map(|i| grid_start + Duration::days(i))
        .collect()
}

/// True when `date` is in the same month as `anchor` (month view dims the
/// grid's leading/trailing days).
pub fn in_anchor_month(date: NaiveDate, anchor: NaiveDate) -> bool {
    date.year() == anchor.year() && date.month() == anchor.month()
}

//! Display-timezone presentation.
//!
//! Stored events and fetch windows are always absolute instants; only
//! labeling and day-bucketing are timezone-sensitive. This module is the
//! single place where instants become wall-clock values, so hour-column
//! headers and event-time labels cannot drift apart (including for zones
//! with non-whole-hour offsets).

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Reserved selector meaning "use the viewer's local clock", distinct from
/// any named zone.
pub const SYSTEM_TIMEZONE: &str = "system";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// The timezone used for labels, day-bucketing, and the now-indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTimezone {
    /// The viewer's local clock, resolved through the platform zone database.
    System,
    Named(Tz),
}

impl Default for DisplayTimezone {
    fn default() -> Self {
        DisplayTimezone::System
    }
}

impl DisplayTimezone {
    /// Parse a timezone identifier, falling back to `System` for unknown
    /// ids. The fallback is logged, never surfaced as an error.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(SYSTEM_TIMEZONE) {
            return DisplayTimezone::System;
        }
        match Tz::from_str(trimmed) {
            Ok(tz) => DisplayTimezone::Named(tz),
            Err(_) => {
                tracing::warn!(timezone = %trimmed, "unknown timezone id, using system timezone");
                DisplayTimezone::System
            }
        }
    }

    /// The identifier to persist: `"system"` or the IANA zone name.
    pub fn identifier(&self) -> String {
        match self {
            DisplayTimezone::System => SYSTEM_TIMEZONE.to_string(),
            DisplayTimezone::Named(tz) => tz.name().to_string(),
        }
    }

    /// The concrete zone labels are produced in.
    pub fn zone(&self) -> Tz {
        match self {
            DisplayTimezone::System => system_zone(),
            DisplayTimezone::Named(tz) => *tz,
        }
    }

    /// Wall-clock (hour, minute) of an instant in this timezone.
    pub fn wall_time(&self, instant: DateTime<Utc>) -> (u32, u32) {
        let local = instant.with_timezone(&self.zone());
        (local.hour(), local.minute())
    }

    /// The one formatting path for all time labels.
    pub fn format_wall_time(&self, instant: DateTime<Utc>) -> String {
        let (hour, minute) = self.wall_time(instant);
        format!("{:02}:{:02}", hour, minute)
    }

    /// Label for an hour column header on `date`. Goes through
    /// [`format_wall_time`](Self::format_wall_time) so headers and event
    /// labels stay aligned.
    pub fn hour_label(&self, date: NaiveDate, hour: u32) -> String {
        let instant = self.day_start_utc(date) + Duration::hours(i64::from(hour));
        self.format_wall_time(instant)
    }

    /// The calendar date an instant falls on in this timezone. Day buckets
    /// for overlap grouping use this, so changing the display timezone can
    /// move an event to a different day bucket.
    pub fn display_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.zone()).date_naive()
    }

    /// Minutes since local midnight for an instant in this timezone.
    pub fn minute_of_day(&self, instant: DateTime<Utc>) -> u32 {
        let (hour, minute) = self.wall_time(instant);
        hour * 60 + minute
    }

    /// The UTC instant at which `date` begins in this timezone.
    ///
    /// Local midnight may not exist (DST gap) or may exist twice; a gap
    /// resolves forward to its end, an ambiguity takes the earlier offset.
    pub fn day_start_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        let tz = self.zone();
        let midnight = date.and_time(NaiveTime::MIN);

        if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
            return dt.with_timezone(&Utc);
        }

        // Midnight fell in a DST gap; scan forward to the first valid local
        // time (gaps are at most a few hours).
        for step in 1..=16 {
            let candidate = midnight + Duration::minutes(15 * step);
            if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
                return dt.with_timezone(&Utc);
            }
        }

        Utc.from_utc_datetime(&midnight)
    }

    /// Current time as a fraction of its display day in `[0, 1)`, for the
    /// now-indicator.
    pub fn now_fraction(&self, now: DateTime<Utc>) -> f64 {
        let local = now.with_timezone(&self.zone());
        f64::from(local.time().num_seconds_from_midnight()) / SECONDS_PER_DAY
    }
}

/// Resolve the viewer's IANA zone once per process; UTC when undetectable.
fn system_zone() -> Tz {
    static SYSTEM_TZ: OnceLock<Tz> = OnceLock::new();
    *SYSTEM_TZ.get_or_init(|| {
        let resolved = iana_time_zone::get_timezone()
            .ok()
            .and_then(|name| Tz::from_str(&name).ok());
        match resolved {
            Some(tz) => tz,
            None => {
                tracing::warn!("could not resolve system timezone, using UTC");
                chrono_tz::UTC
            }
        }
    })
}

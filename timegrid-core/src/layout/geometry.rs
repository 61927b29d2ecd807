//! Geometry projection.
//!
//! Converts lane assignments and instants into percentage render boxes for
//! the timeline (day/week) views, and capped per-day listings for the month
//! view. All percentages are relative to one day row: the 24-hour axis
//! horizontally, the resource row height vertically.

use chrono::NaiveDate;
use serde::Serialize;

use crate::event::Event;
use crate::layout::lanes::LaneAssignment;
use crate::tz::DisplayTimezone;

const MINUTES_PER_DAY: f64 = 1440.0;

/// Vertical breathing room between stacked lanes, in percent of the row.
const LANE_INSET_PERCENT: f64 = 1.0;

/// Width given to degraded `end <= start` markers so data-entry errors stay
/// visible instead of silently disappearing.
const MARKER_WIDTH_PERCENT: f64 = 0.75;

/// Most entries a month day cell lists before overflowing.
pub const MONTH_CELL_CAP: usize = 3;

/// One positioned event for the timeline renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderBox {
    pub event_id: String,
    pub title: String,
    pub resource_id: String,
    /// The display day this box belongs to.
    pub day: NaiveDate,
    pub lane: usize,
    pub lane_count: usize,
    /// Horizontal position along the 24-hour axis, 0-100.
    pub offset_percent: f64,
    pub width_percent: f64,
    /// Vertical position within the resource row, 0-100.
    pub top_percent: f64,
    pub height_percent: f64,
    /// Start-end label, produced by the display timezone's formatting path.
    pub label_time: String,
    pub color_key: String,
    /// True when the event degraded to a minimal-width marker.
    pub marker: bool,
}

/// One listed event in a month day cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthEntry {
    pub event_id: String,
    pub title: String,
    pub label_time: String,
    pub color_key: String,
}

/// A month-view day cell: at most [`MONTH_CELL_CAP`] entries plus the count
/// of events that did not fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub entries: Vec<MonthEntry>,
    pub overflow: usize,
}

/// Project one event onto its display day's timeline row.
///
/// Minute-of-day is computed after timezone conversion, against the
/// displayed day. An event crossing midnight in the display timezone is
/// clamped to the 24-hour axis of the day holding its displayed start.
pub fn timeline_box(
    event: &Event,
    assignment: &LaneAssignment,
    day: NaiveDate,
    tz: &DisplayTimezone,
) -> RenderBox {
    let start_minute = f64::from(tz.minute_of_day(event.start));

    let degraded = event.end <= event.start;
    let (width_percent, marker) = if degraded {
        (MARKER_WIDTH_PERCENT, true)
    } else {
        let end_minute = if tz.display_date(event.end) > day {
            MINUTES_PER_DAY
        } else {
            f64::from(tz.minute_of_day(event.end))
        };
        ((end_minute - start_minute) / MINUTES_PER_DAY * 100.0, false)
    };

    let lane_height = 100.0 / assignment.lane_count as f64;
    let top_percent = assignment.lane as f64 * lane_height + LANE_INSET_PERCENT;
    let height_percent = (lane_height - 2.0 * LANE_INSET_PERCENT).max(1.0);

    let label_time = if marker {
        tz.format_wall_time(event.start)
    } else {
        format!(
            "{}-{}",
            tz.format_wall_time(event.start),
            tz.format_wall_time(event.end)
        )
    };

    RenderBox {
        event_id: event.id.clone(),
        title: event.title.clone(),
        resource_id: event.resource_id.clone(),
        day,
        lane: assignment.lane,
        lane_count: assignment.lane_count,
        offset_percent: start_minute / MINUTES_PER_DAY * 100.0,
        width_percent,
        top_percent,
        height_percent,
        label_time,
        color_key: event.color_key.clone(),
        marker,
    }
}

/// Build one month day cell from that day's events (already sorted by the
/// caller). No lane math in month view.
pub fn month_cell(date: NaiveDate, events: &[&Event], tz: &DisplayTimezone) -> DayCell {
    let entries = events
        .iter()
        .take(MONTH_CELL_CAP)
        .map(|event| MonthEntry {
            event_id: event.id.clone(),
            title: event.title.clone(),
            label_time: tz.format_wall_time(event.start),
            color_key: event.color_key.clone(),
        })
        .collect();

    DayCell {
        date,
        entries,
        overflow: events.len().saturating_sub(MONTH_CELL_CAP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, start: (u32, u32), end: (u32, u32)) -> Event {
        Event {
            id: id.to_string(),
            resource_id: "r1".to_string(),
            title: id.to_string(),
            start: Utc.with_ymd_and_hms(2026, 8, 5, start.0, start.1, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 8, 5, end.0, end.1, 0).unwrap(),
            color_key: "blue".to_string(),
            description: None,
            location: None,
            attendees: vec![],
            external_link: None,
        }
    }

    fn assignment(lane: usize, lane_count: usize) -> LaneAssignment {
        LaneAssignment {
            event_id: "e".to_string(),
            lane,
            lane_count,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
    }

    #[test]
    fn box_positions_follow_minute_of_day() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let bx = timeline_box(&event("e", (6, 0), (12, 0)), &assignment(0, 1), day(), &tz);

        assert!((bx.offset_percent - 25.0).abs() < 1e-9);
        assert!((bx.width_percent - 25.0).abs() < 1e-9);
        assert!(!bx.marker);
        assert_eq!(bx.label_time, "06:00-12:00");
    }

    #[test]
    fn in_day_event_stays_within_the_axis() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let bx = timeline_box(&event("e", (23, 0), (23, 45)), &assignment(0, 1), day(), &tz);

        assert!(bx.offset_percent + bx.width_percent <= 100.0 + 1e-9);
    }

    #[test]
    fn lanes_split_the_row_evenly() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let top = timeline_box(&event("e", (9, 0), (10, 0)), &assignment(0, 2), day(), &tz);
        let bottom = timeline_box(&event("e", (9, 0), (10, 0)), &assignment(1, 2), day(), &tz);

        assert!(top.top_percent < bottom.top_percent);
        assert!((bottom.top_percent - 51.0).abs() < 1e-9);
        assert!((top.height_percent - 48.0).abs() < 1e-9);
        // The inset keeps stacked boxes from touching.
        assert!(top.top_percent + top.height_percent < bottom.top_percent);
    }

    #[test]
    fn inverted_range_degrades_to_marker() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let inverted = event("e", (10, 0), (9, 0));
        let bx = timeline_box(&inverted, &assignment(0, 1), day(), &tz);

        assert!(bx.marker);
        assert!((bx.width_percent - MARKER_WIDTH_PERCENT).abs() < 1e-9);
        assert_eq!(bx.label_time, "10:00");
    }

    #[test]
    fn zero_duration_degrades_to_marker() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let bx = timeline_box(&event("e", (9, 0), (9, 0)), &assignment(0, 1), day(), &tz);

        assert!(bx.marker);
    }

    #[test]
    fn midnight_crosser_is_clamped_to_its_display_day() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let mut crosser = event("e", (22, 0), (23, 0));
        crosser.end = Utc.with_ymd_and_hms(2026, 8, 6, 2, 0, 0).unwrap();
        let bx = timeline_box(&crosser, &assignment(0, 1), day(), &tz);

        assert!((bx.offset_percent - (22.0 / 24.0 * 100.0)).abs() < 1e-9);
        assert!((bx.offset_percent + bx.width_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn labels_move_with_the_display_timezone() {
        let utc_box = timeline_box(
            &event("e", (9, 0), (10, 0)),
            &assignment(0, 1),
            day(),
            &DisplayTimezone::Named(chrono_tz::UTC),
        );
        let tokyo_box = timeline_box(
            &event("e", (9, 0), (10, 0)),
            &assignment(0, 1),
            day(),
            &DisplayTimezone::Named(chrono_tz::Asia::Tokyo),
        );

        assert_eq!(utc_box.label_time, "09:00-10:00");
        assert_eq!(tokyo_box.label_time, "18:00-19:00");
    }

    #[test]
    fn month_cell_caps_and_counts_overflow() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let events: Vec<Event> = (0..5)
            .map(|i| event(&format!("e{i}"), (9 + i, 0), (10 + i, 0)))
            .collect();
        let refs: Vec<&Event> = events.iter().collect();
        let cell = month_cell(day(), &refs, &tz);

        assert_eq!(cell.entries.len(), MONTH_CELL_CAP);
        assert_eq!(cell.overflow, 2);
        assert_eq!(cell.entries[0].event_id, "e0");
    }

    #[test]
    fn month_cell_under_cap_has_no_overflow() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let events = [event("e0", (9, 0), (10, 0))];
        let refs: Vec<&Event> = events.iter().collect();
        let cell = month_cell(day(), &refs, &tz);

        assert_eq!(cell.entries.len(), 1);
        assert_eq!(cell.overflow, 0);
    }
}

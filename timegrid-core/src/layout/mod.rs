//! The layout pipeline.
//!
//! [`compute_layout`] is a pure, synchronous function of `(events, window,
//! active resources, display timezone)`. It is re-run in full on every
//! state change; no layout state survives between render cycles.
//!
//! Pipeline: bucket by (resource, display day) -> cluster transitive
//! overlaps -> assign lanes -> project geometry.

pub mod cluster;
pub mod geometry;
pub mod lanes;

pub use cluster::{OverlapCluster, cluster_events, overlaps};
pub use geometry::{DayCell, MONTH_CELL_CAP, MonthEntry, RenderBox, month_cell, timeline_box};
pub use lanes::{LaneAssignment, assign_lanes};

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::event::{Event, Resource};
use crate::tz::DisplayTimezone;
use crate::window::{Granularity, TimeWindow};

/// Everything the renderer and shell need for one cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    /// Timeline boxes (day/week views). Empty in month view.
    pub boxes: Vec<RenderBox>,
    /// Month day cells in grid order. Empty in day/week views.
    pub month: Vec<DayCell>,
    /// Per-day overflow counts for the shell (month view only).
    pub overflow: BTreeMap<NaiveDate, usize>,
}

/// Compute the full layout for one render cycle.
///
/// Only events belonging to an active resource and whose displayed start
/// falls on a rendered day enter layout. Day-bucketing happens in the
/// display timezone, so a timezone change alone can move an event between
/// buckets.
pub fn compute_layout(
    events: &[Event],
    window: &TimeWindow,
    resources: &[Resource],
    tz: &DisplayTimezone,
) -> Layout {
    let active: HashSet<&str> = resources
        .iter()
        .filter(|r| r.active)
        .map(|r| r.id.as_str())
        .collect();
    let rendered_days: HashSet<NaiveDate> = window.days.iter().copied().collect();

    let visible: Vec<&Event> = events
        .iter()
        .filter(|e| active.contains(e.resource_id.as_str()))
        .filter(|e| rendered_days.contains(&tz.display_date(e.start)))
        .collect();

    match window.granularity {
        Granularity::Day | Granularity::Week => timeline_layout(&visible, tz),
        Granularity::Month => month_layout(&visible, window, tz),
    }
}

fn timeline_layout(visible: &[&Event], tz: &DisplayTimezone) -> Layout {
    // BTreeMap keys keep bucket iteration, and thus box order, deterministic.
    let mut buckets: BTreeMap<(String, NaiveDate), Vec<Event>> = BTreeMap::new();
    for event in visible {
        let key = (event.resource_id.clone(), tz.display_date(event.start));
        buckets.entry(key).or_default().push((*event).clone());
    }

    let mut boxes = Vec::new();
    for ((_, day), bucket) in buckets {
        for cluster in cluster_events(bucket) {
            let assignments = assign_lanes(&cluster);
            for (event, assignment) in cluster.events.iter().zip(&assignments) {
                boxes.push(timeline_box(event, assignment, day, tz));
            }
        }
    }

    Layout {
        boxes,
        ..Layout::default()
    }
}

fn month_layout(visible: &[&Event], window: &TimeWindow, tz: &DisplayTimezone) -> Layout {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Event>> = BTreeMap::new();
    for event in visible {
        by_day
            .entry(tz.display_date(event.start))
            .or_default()
            .push(event);
    }
    for bucket in by_day.values_mut() {
        bucket.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    }

    let month: Vec<DayCell> = window
        .days
        .iter()
        .map(|day| {
            let events = by_day.get(day).map(Vec::as_slice).unwrap_or_default();
            month_cell(*day, events, tz)
        })
        .collect();

    let overflow = month
        .iter()
        .filter(|cell| cell.overflow > 0)
        .map(|cell| (cell.date, cell.overflow))
        .collect();

    Layout {
        month,
        overflow,
        ..Layout::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event_on(id: &str, resource: &str, day: u32, start: (u32, u32), end: (u32, u32)) -> Event {
        Event {
            id: id.to_string(),
            resource_id: resource.to_string(),
            title: id.to_string(),
            start: Utc.with_ymd_and_hms(2026, 8, day, start.0, start.1, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 8, day, end.0, end.1, 0).unwrap(),
            color_key: "blue".to_string(),
            description: None,
            location: None,
            attendees: vec![],
            external_link: None,
        }
    }

    fn resources() -> Vec<Resource> {
        vec![
            Resource::new("r1", "Team", "blue"),
            Resource::new("r2", "Personal", "green"),
        ]
    }

    fn utc_tz() -> DisplayTimezone {
        DisplayTimezone::Named(chrono_tz::UTC)
    }

    fn week_window() -> TimeWindow {
        let anchor = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        TimeWindow::resolve(anchor, Granularity::Week, &utc_tz())
    }

    fn box_for<'a>(layout: &'a Layout, id: &str) -> &'a RenderBox {
        layout.boxes.iter().find(|b| b.event_id == id).unwrap()
    }

    #[test]
    fn overlapping_pair_and_disjoint_event() {
        // Two overlapping morning events share a cluster; the late one
        // stands alone with the full row to itself.
        let events = vec![
            event_on("e1", "r1", 5, (9, 0), (10, 0)),
            event_on("e2", "r1", 5, (9, 30), (10, 30)),
            event_on("e3", "r1", 5, (11, 0), (12, 0)),
        ];
        let layout = compute_layout(&events, &week_window(), &resources(), &utc_tz());

        assert_eq!(layout.boxes.len(), 3);
        let (b1, b2, b3) = (
            box_for(&layout, "e1"),
            box_for(&layout, "e2"),
            box_for(&layout, "e3"),
        );
        assert_ne!(b1.lane, b2.lane);
        assert_eq!(b1.lane_count, 2);
        assert_eq!(b2.lane_count, 2);
        assert_eq!((b3.lane, b3.lane_count), (0, 1));
    }

    #[test]
    fn same_instants_on_different_resources_do_not_interact() {
        let events = vec![
            event_on("e1", "r1", 5, (14, 0), (15, 0)),
            event_on("e2", "r2", 5, (14, 0), (15, 0)),
        ];
        let layout = compute_layout(&events, &week_window(), &resources(), &utc_tz());

        assert_eq!(box_for(&layout, "e1").lane_count, 1);
        assert_eq!(box_for(&layout, "e2").lane_count, 1);
    }

    #[test]
    fn inactive_resource_is_excluded() {
        let mut resources = resources();
        resources[1].active = false;
        let events = vec![
            event_on("e1", "r1", 5, (9, 0), (10, 0)),
            event_on("e2", "r2", 5, (9, 0), (10, 0)),
        ];
        let layout = compute_layout(&events, &week_window(), &resources, &utc_tz());

        assert_eq!(layout.boxes.len(), 1);
        assert_eq!(layout.boxes[0].event_id, "e1");
    }

    #[test]
    fn event_outside_the_window_is_excluded() {
        let events = vec![event_on("e1", "r1", 20, (9, 0), (10, 0))];
        let layout = compute_layout(&events, &week_window(), &resources(), &utc_tz());

        assert!(layout.boxes.is_empty());
    }

    #[test]
    fn timezone_change_rebuckets_without_new_events() {
        // 23:30 UTC on the 5th is already the 6th in Tokyo; the event moves
        // to a different day bucket when only the display timezone changes.
        let events = vec![event_on("e1", "r1", 5, (23, 30), (23, 45))];
        let window = week_window();

        let utc_layout = compute_layout(&events, &window, &resources(), &utc_tz());
        let tokyo = DisplayTimezone::Named(chrono_tz::Asia::Tokyo);
        let tokyo_layout = compute_layout(&events, &window, &resources(), &tokyo);

        assert_eq!(utc_layout.boxes[0].day, NaiveDate::from_ymd_opt(2026, 8, 5).unwrap());
        assert_eq!(tokyo_layout.boxes[0].day, NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
        // The instants themselves never moved; only labels did.
        assert_eq!(utc_layout.boxes[0].label_time, "23:30-23:45");
        assert_eq!(tokyo_layout.boxes[0].label_time, "08:30-08:45");
    }

    #[test]
    fn month_view_reports_overflow_to_the_shell() {
        let anchor = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        let window = TimeWindow::resolve(anchor, Granularity::Month, &utc_tz());
        let events: Vec<Event> = (0..5)
            .map(|i| event_on(&format!("e{i}"), "r1", 5, (9 + i, 0), (10 + i, 0)))
            .collect();
        let layout = compute_layout(&events, &window, &resources(), &utc_tz());

        assert!(layout.boxes.is_empty());
        assert_eq!(layout.month.len(), 42);
        let day = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert_eq!(layout.overflow.get(&day), Some(&2));
        let cell = layout.month.iter().find(|c| c.date == day).unwrap();
        assert_eq!(cell.entries.len(), MONTH_CELL_CAP);
    }

    #[test]
    fn rerun_on_identical_input_is_identical() {
        let events = vec![
            event_on("e1", "r1", 5, (9, 0), (10, 0)),
            event_on("e2", "r1", 5, (9, 30), (10, 30)),
            event_on("e3", "r2", 6, (11, 0), (12, 0)),
        ];
        let window = week_window();
        let first = compute_layout(&events, &window, &resources(), &utc_tz());
        let second = compute_layout(&events, &window, &resources(), &utc_tz());

        assert_eq!(first, second);
    }
}

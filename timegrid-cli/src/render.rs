//! Terminal rendering for timegrid layouts.
//!
//! Consumes the engine's percentage boxes and month cells and draws them as
//! colored text: one 96-cell track per lane for day/week views (one cell
//! per 15 minutes), a 7-column grid for month view.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use owo_colors::{AnsiColors, OwoColorize};
use timegrid_core::controller::{Notice, Snapshot};
use timegrid_core::event::Resource;
use timegrid_core::layout::{MONTH_CELL_CAP, RenderBox};
use timegrid_core::tz::DisplayTimezone;
use timegrid_core::window::{Granularity, in_anchor_month};

/// Character cells across the 24-hour axis: one per 15 minutes.
pub const TRACK_WIDTH: usize = 96;

const ROW_LABEL_WIDTH: usize = 12;
const MONTH_CELL_WIDTH: usize = 14;

/// Extension trait for colored terminal rendering.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Notice {
    fn render(&self) -> String {
        match self {
            Notice::FetchFailed(msg) => format!(
                "{} {}",
                "!".yellow().bold(),
                format!("Showing last loaded events (fetch failed: {})", msg).yellow()
            ),
        }
    }
}

impl Render for Resource {
    fn render(&self) -> String {
        let dot = "●".color(palette_color(&self.color_key)).to_string();
        if self.active {
            format!("{} {}", dot, self.display_name)
        } else {
            format!("{} {}", dot, format!("{} (hidden)", self.display_name).dimmed())
        }
    }
}

/// Render one laid-out cycle to a printable string.
pub fn render_snapshot(
    snapshot: &Snapshot,
    resources: &[Resource],
    tz: &DisplayTimezone,
    anchor: NaiveDate,
    now_fraction: Option<f64>,
) -> String {
    let mut lines = vec![header(snapshot, tz, anchor), String::new()];

    match snapshot.window.granularity {
        Granularity::Day | Granularity::Week => {
            render_timeline(snapshot, resources, tz, now_fraction, &mut lines);
        }
        Granularity::Month => render_month(snapshot, anchor, &mut lines),
    }

    lines.join("\n")
}

fn header(snapshot: &Snapshot, tz: &DisplayTimezone, anchor: NaiveDate) -> String {
    let window = &snapshot.window;
    let label = match window.granularity {
        Granularity::Day => window.first_day().format("%A %Y-%m-%d").to_string(),
        Granularity::Week => format!(
            "Week {} to {}",
            window.first_day().format("%Y-%m-%d"),
            window.last_day().format("%Y-%m-%d")
        ),
        Granularity::Month => anchor.format("%B %Y").to_string(),
    };
    format!(
        "{} {}",
        label.bold(),
        format!("[{}]", tz.zone().name()).dimmed()
    )
}

fn render_timeline(
    snapshot: &Snapshot,
    resources: &[Resource],
    tz: &DisplayTimezone,
    now_fraction: Option<f64>,
    lines: &mut Vec<String>,
) {
    let mut by_day_resource: BTreeMap<(NaiveDate, &str), Vec<&RenderBox>> = BTreeMap::new();
    for bx in &snapshot.layout.boxes {
        by_day_resource
            .entry((bx.day, bx.resource_id.as_str()))
            .or_default()
            .push(bx);
    }

    let today = tz.display_date(Utc::now());

    for day in &snapshot.window.days {
        let heading = day.format("%a %Y-%m-%d").to_string();
        if *day == today {
            lines.push(heading.bold().underline().to_string());
        } else {
            lines.push(heading.bold().to_string());
        }
        lines.push(format!("{} {}", " ".repeat(ROW_LABEL_WIDTH), hour_ruler(*day, tz)));

        if *day == today {
            if let Some(fraction) = now_fraction {
                lines.push(format!(
                    "{} {}",
                    fit("now", ROW_LABEL_WIDTH).dimmed(),
                    now_line(fraction).red()
                ));
            }
        }

        for resource in resources.iter().filter(|r| r.active) {
            let boxes = by_day_resource
                .get(&(*day, resource.id.as_str()))
                .map(Vec::as_slice)
                .unwrap_or_default();

            let lane_max = boxes.iter().map(|b| b.lane).max().unwrap_or(0);
            for lane in 0..=lane_max {
                let label = if lane == 0 { resource.display_name.as_str() } else { "" };
                let lane_boxes: Vec<&RenderBox> =
                    boxes.iter().filter(|b| b.lane == lane).copied().collect();
                lines.push(format!(
                    "{} {}",
                    fit(label, ROW_LABEL_WIDTH),
                    lane_track(&lane_boxes)
                ));
            }
        }
        lines.push(String::new());
    }
}

/// Hour marks every three hours, produced by the same formatting path as
/// event labels so non-whole-hour offsets stay aligned.
fn hour_ruler(day: NaiveDate, tz: &DisplayTimezone) -> String {
    (0..24)
        .step_by(3)
        .map(|hour| fit(&tz.hour_label(day, hour), TRACK_WIDTH / 8))
        .collect()
}

fn now_line(fraction: f64) -> String {
    let position = ((fraction * TRACK_WIDTH as f64) as usize).min(TRACK_WIDTH - 1);
    format!("{}^", " ".repeat(position))
}

/// One lane's worth of track: spans over a dotted baseline.
fn lane_track(boxes: &[&RenderBox]) -> String {
    let mut spans: Vec<(usize, usize, &RenderBox)> = boxes
        .iter()
        .map(|bx| {
            let (start, len) = track_span(bx.offset_percent, bx.width_percent);
            (start, len, *bx)
        })
        .collect();
    spans.sort_by_key(|(start, _, _)| *start);

    let mut out = String::new();
    let mut cursor = 0;
    for (start, len, bx) in spans {
        if start < cursor {
            // Rounding collision with the previous span; nothing to draw.
            continue;
        }
        out.push_str(&".".repeat(start - cursor).dimmed().to_string());
        out.push_str(&span_text(bx, len).color(palette_color(&bx.color_key)).to_string());
        cursor = start + len;
    }
    out.push_str(
        &".".repeat(TRACK_WIDTH.saturating_sub(cursor))
            .dimmed()
            .to_string(),
    );
    out
}

/// Map a percentage box onto track cells. End-exclusive, minimum one cell.
pub(crate) fn track_span(offset_percent: f64, width_percent: f64) -> (usize, usize) {
    let start = ((offset_percent / 100.0) * TRACK_WIDTH as f64).floor() as usize;
    let start = start.min(TRACK_WIDTH - 1);
    let end = (((offset_percent + width_percent) / 100.0) * TRACK_WIDTH as f64).floor() as usize;
    let len = end.saturating_sub(start).max(1).min(TRACK_WIDTH - start);
    (start, len)
}

fn span_text(bx: &RenderBox, len: usize) -> String {
    if bx.marker {
        return "!".repeat(len);
    }
    if len <= 2 {
        return "|".repeat(len);
    }
    let inner = len - 2;
    format!("[{}]", fit(&bx.title, inner))
}

/// Truncate or pad to an exact width. Applied before colorizing, so ANSI
/// codes never distort the column math.
fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let mut count = out.chars().count();
    while count < width {
        out.push(' ');
        count += 1;
    }
    out
}

fn render_month(snapshot: &Snapshot, anchor: NaiveDate, lines: &mut Vec<String>) {
    let weekday_header: String = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
        .iter()
        .map(|d| fit(d, MONTH_CELL_WIDTH))
        .collect();
    lines.push(weekday_header.bold().to_string());

    for week in snapshot.layout.month.chunks(7) {
        let mut number_line = String::new();
        for cell in week {
            let number = fit(&cell.date.day().to_string(), MONTH_CELL_WIDTH);
            if in_anchor_month(cell.date, anchor) {
                number_line.push_str(&number.bold().to_string());
            } else {
                number_line.push_str(&number.dimmed().to_string());
            }
        }
        lines.push(number_line);

        let rows = week
            .iter()
            .map(|cell| cell.entries.len() + usize::from(cell.overflow > 0))
            .max()
            .unwrap_or(0)
            .min(MONTH_CELL_CAP + 1);
        for row in 0..rows {
            let mut line = String::new();
            for cell in week {
                if row < cell.entries.len() {
                    let entry = &cell.entries[row];
                    let text = fit(
                        &format!("{} {}", entry.label_time, entry.title),
                        MONTH_CELL_WIDTH,
                    );
                    line.push_str(&text.color(palette_color(&entry.color_key)).to_string());
                } else if row == cell.entries.len() && cell.overflow > 0 {
                    let text = fit(&format!("+{} more", cell.overflow), MONTH_CELL_WIDTH);
                    line.push_str(&text.dimmed().to_string());
                } else {
                    line.push_str(&" ".repeat(MONTH_CELL_WIDTH));
                }
            }
            lines.push(line);
        }
        lines.push(String::new());
    }
}

fn palette_color(key: &str) -> AnsiColors {
    match key {
        "blue" => AnsiColors::Blue,
        "green" => AnsiColors::Green,
        "yellow" => AnsiColors::Yellow,
        "magenta" => AnsiColors::Magenta,
        "cyan" => AnsiColors::Cyan,
        "red" => AnsiColors::Red,
        _ => AnsiColors::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_span_maps_minutes_to_cells() {
        // 09:00-10:00 on a 96-cell day: cells 36..40.
        assert_eq!(track_span(37.5, 1.0 / 24.0 * 100.0), (36, 4));
        // Full day covers the whole track.
        assert_eq!(track_span(0.0, 100.0), (0, 96));
    }

    #[test]
    fn track_span_never_collapses_to_zero_cells() {
        let (_, len) = track_span(50.0, 0.0);
        assert_eq!(len, 1);
    }

    #[test]
    fn track_span_stays_inside_the_track() {
        let (start, len) = track_span(99.9, 5.0);
        assert!(start + len <= TRACK_WIDTH);
    }

    #[test]
    fn back_to_back_spans_do_not_collide() {
        let first = track_span(37.5, 1.0 / 48.0 * 100.0); // 09:00-09:30
        let second = track_span(39.583_333, 1.0 / 48.0 * 100.0); // 09:30-10:00
        assert_eq!(first.0 + first.1, second.0);
    }

    #[test]
    fn fit_truncates_and_pads() {
        assert_eq!(fit("Standup", 4), "Stan");
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("", 3), "   ");
    }

    #[test]
    fn hour_ruler_spans_the_track() {
        let tz = DisplayTimezone::Named(chrono_tz::UTC);
        let day = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        let ruler = hour_ruler(day, &tz);
        assert_eq!(ruler.chars().count(), TRACK_WIDTH);
        assert!(ruler.starts_with("00:00"));
        assert!(ruler.contains("12:00"));
    }
}

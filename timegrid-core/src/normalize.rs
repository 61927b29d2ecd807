//! Event normalization.
//!
//! Converts raw per-account events into canonical [`Event`] values with
//! absolute UTC instants. Normalization is lenient: one malformed event is
//! dropped with a diagnostic and never aborts the rest of the batch.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event::{Event, Resource};
use crate::source::RawEvent;

const FALLBACK_COLOR_KEY: &str = "default";
const FALLBACK_TITLE: &str = "(No title)";

/// Normalize a fetched batch. Events with unparseable or missing instants
/// are dropped; `end <= start` is kept and degrades to a marker box at
/// geometry time.
pub fn normalize_events(raw: Vec<RawEvent>, resources: &[Resource]) -> Vec<Event> {
    raw.into_iter()
        .filter_map(|r| normalize_event(r, resources))
        .collect()
}

fn normalize_event(raw: RawEvent, resources: &[Resource]) -> Option<Event> {
    let start = parse_instant(&raw.start, &raw.id, "start")?;
    let end = parse_instant(&raw.end, &raw.id, "end")?;

    let id = if raw.id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        raw.id
    };

    let title = if raw.title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        raw.title
    };

    // Color falls back to the owning resource's palette key.
    let color_key = raw
        .color_key
        .or_else(|| {
            resources
                .iter()
                .find(|res| res.id == raw.resource_id)
                .map(|res| res.color_key.clone())
        })
        .unwrap_or_else(|| FALLBACK_COLOR_KEY.to_string());

    Some(Event {
        id,
        resource_id: raw.resource_id,
        title,
        start,
        end,
        color_key,
        description: raw.description,
        location: raw.location,
        attendees: raw.attendees,
        external_link: raw.external_link,
    })
}

fn parse_instant(value: &str, event_id: &str, field: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(err) => {
            tracing::warn!(
                event_id = %event_id,
                field,
                value = %value,
                error = %err,
                "dropping event with malformed instant"
            );
            None
        }
    }
}

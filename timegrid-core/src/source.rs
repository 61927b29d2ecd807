//! Event-source collaborator port.
//!
//! The engine never talks to calendar providers directly. A source hands it
//! raw events for a window and set of resources; the engine normalizes,
//! lays out, and renders. Provider concerns (authentication, remote APIs,
//! recurrence expansion) live entirely behind this boundary.

use serde::{Deserialize, Serialize};

use crate::error::TimeGridResult;
use crate::event::Resource;
use crate::window::TimeWindow;

/// Wire form of an event as delivered by a source.
///
/// Instants are RFC 3339 strings and must carry an explicit offset (UTC or
/// otherwise) -- never naive local time. Anything unparseable makes the
/// event malformed and it is dropped during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// May be empty; the normalizer fills in a generated id.
    #[serde(default)]
    pub id: String,
    pub resource_id: String,
    pub title: String,
    /// RFC 3339 instant with explicit offset.
    pub start: String,
    /// RFC 3339 instant with explicit offset.
    pub end: String,
    #[serde(default)]
    pub color_key: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub external_link: Option<String>,
}

/// Where events come from.
///
/// `fetch_events` returns every event overlapping the window's `[start,
/// end)` range for the requested resources. The caller handles staleness;
/// implementations only need to answer the question they were asked.
pub trait EventSource {
    fn list_resources(&self) -> TimeGridResult<Vec<Resource>>;

    fn fetch_events(
        &self,
        window: &TimeWindow,
        resource_ids: &[String],
    ) -> impl Future<Output = TimeGridResult<Vec<RawEvent>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_defaults_optional_fields() {
        let json = r#"{
            "id": "e1",
            "resource_id": "work",
            "title": "Standup",
            "start": "2026-08-05T09:00:00+02:00",
            "end": "2026-08-05T09:30:00+02:00"
        }"#;

        let raw: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(raw.id, "e1");
        assert_eq!(raw.resource_id, "work");
        assert!(raw.color_key.is_none());
        assert!(raw.attendees.is_empty());
        assert!(raw.external_link.is_none());
    }
}

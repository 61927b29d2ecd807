//! Canonical event and resource types.
//!
//! These types represent calendar events in a source-agnostic way. Event
//! sources convert their data into these types, and the layout engine works
//! exclusively with them. Within one fetch cycle they are immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled event with absolute instants (source-neutral).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// The calendar/account this event came from.
    pub resource_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    /// Exclusive end instant. `end <= start` is tolerated here and degrades
    /// to a marker box at geometry time.
    pub end: DateTime<Utc>,
    /// Color palette key, inherited from the resource when the source
    /// provides none.
    pub color_key: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
    /// Link back to the event in its upstream calendar, if any.
    pub external_link: Option<String>,
}

/// One calendar/account contributing events, rendered as a row in day/week
/// view. Only active resources enter layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub display_name: String,
    pub color_key: String,
    pub active: bool,
}

impl Resource {
    pub fn new(id: &str, display_name: &str, color_key: &str) -> Self {
        Resource {
            id: id.to_string(),
            display_name: display_name.to_string(),
            color_key: color_key.to_string(),
            active: true,
        }
    }
}

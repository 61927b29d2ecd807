//! Local ICS directory event source.
//!
//! The stand-in for the remote provider collaborator: one subdirectory per
//! calendar under the root, one `.ics` file per event inside it. It answers
//! fetches with raw events and knows nothing about layout.
//!
//! Only absolute instants cross the source boundary. Floating and date-only
//! ICS times have no well-defined instant, so those events are skipped with
//! a diagnostic, as are cancelled ones.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use icalendar::parser::{read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use timegrid_core::error::{TimeGridError, TimeGridResult};
use timegrid_core::event::Resource;
use timegrid_core::source::{EventSource, RawEvent};
use timegrid_core::window::TimeWindow;

/// Color keys handed out to calendars in directory order.
const RESOURCE_PALETTE: [&str; 6] = ["blue", "green", "yellow", "magenta", "cyan", "red"];

pub struct IcsDirSource {
    root: PathBuf,
}

impl IcsDirSource {
    pub fn new(root: PathBuf) -> Self {
        IcsDirSource { root }
    }

    /// Calendar subdirectories in sorted order, so palette assignment and
    /// resource listing are stable.
    fn resource_dirs(&self) -> TimeGridResult<Vec<(String, PathBuf)>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            TimeGridError::Source(format!(
                "Cannot read calendar directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut dirs: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_string();
                Some((name, path))
            })
            .filter(|(name, _)| !name.starts_with('.'))
            .collect();
        dirs.sort();
        Ok(dirs)
    }

    fn events_in_dir(&self, dir: &Path, resource_id: &str) -> Vec<(RawEvent, DateTime<Utc>, DateTime<Utc>)> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "skipping unreadable calendar directory");
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "ics"))
            .filter_map(|path| {
                let content = std::fs::read_to_string(&path).ok()?;
                parse_ics_event(&content, resource_id)
            })
            .collect()
    }
}

impl EventSource for IcsDirSource {
    fn list_resources(&self) -> TimeGridResult<Vec<Resource>> {
        let resources = self
            .resource_dirs()?
            .into_iter()
            .enumerate()
            .map(|(i, (name, _))| {
                Resource::new(&name, &name, RESOURCE_PALETTE[i % RESOURCE_PALETTE.len()])
            })
            .collect();
        Ok(resources)
    }

    async fn fetch_events(
        &self,
        window: &TimeWindow,
        resource_ids: &[String],
    ) -> TimeGridResult<Vec<RawEvent>> {
        let mut events = Vec::new();
        for (name, dir) in self.resource_dirs()? {
            if !resource_ids.contains(&name) {
                continue;
            }
            for (raw, start, end) in self.events_in_dir(&dir, &name) {
                // Half-open overlap with the fetch window
                if start < window.end && end > window.start {
                    events.push(raw);
                }
            }
        }
        Ok(events)
    }
}

/// Parse one `.ics` file into a raw event. Returns the instants alongside
/// so the caller can window-filter without re-parsing.
fn parse_ics_event(
    content: &str,
    resource_id: &str,
) -> Option<(RawEvent, DateTime<Utc>, DateTime<Utc>)> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_default();

    // Cancelled events never reach layout
    if vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref() == "CANCELLED")
    {
        tracing::debug!(uid = %uid, "skipping cancelled event");
        return None;
    }

    let start = to_instant(
        DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?,
        &uid,
    )?;
    let end = to_instant(
        DatePerhapsTime::try_from(vevent.find_prop("DTEND")?).ok()?,
        &uid,
    )?;

    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let location = vevent.find_prop("LOCATION").map(|p| p.val.to_string());
    let external_link = vevent.find_prop("URL").map(|p| p.val.to_string());

    let attendees: Vec<String> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .map(|p| {
            p.val
                .as_ref()
                .strip_prefix("mailto:")
                .unwrap_or(p.val.as_ref())
                .to_string()
        })
        .collect();

    let raw = RawEvent {
        id: uid,
        resource_id: resource_id.to_string(),
        title,
        start: start.to_rfc3339(),
        end: end.to_rfc3339(),
        color_key: None,
        description,
        location,
        attendees,
        external_link,
    };

    Some((raw, start, end))
}

/// Resolve an ICS time to an absolute instant, or reject it.
fn to_instant(dpt: DatePerhapsTime, uid: &str) -> Option<DateTime<Utc>> {
    match dpt {
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz = match chrono_tz::Tz::from_str(&tzid) {
                Ok(tz) => tz,
                Err(_) => {
                    tracing::warn!(uid = %uid, tzid = %tzid, "skipping event with unknown TZID");
                    return None;
                }
            };
            match tz.from_local_datetime(&date_time).earliest() {
                Some(dt) => Some(dt.with_timezone(&Utc)),
                None => {
                    tracing::warn!(uid = %uid, tzid = %tzid, "skipping event with nonexistent local time");
                    None
                }
            }
        }
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(_)) => {
            tracing::warn!(uid = %uid, "skipping event with floating time (no offset)");
            None
        }
        DatePerhapsTime::Date(_) => {
            tracing::debug!(uid = %uid, "skipping all-day event");
            None
        }
    }
}

//! View controller.
//!
//! Owns the navigation state (granularity, anchor, resource selection,
//! display timezone) and orchestrates the render cycle: resolve window ->
//! fetch -> normalize -> layout. Layout itself is pure and re-run on every
//! state change; the controller's job is sequencing the one asynchronous
//! step, the event fetch.
//!
//! Fetches are driven by the caller: a state transition returns a
//! [`FetchTicket`] when data is missing, the caller runs it against an
//! [`EventSource`], and hands the result back to [`complete_fetch`]. A
//! completion is applied only if no newer fetch was issued in the meantime,
//! so a late response can never overwrite the layout for a newer window.
//!
//! [`complete_fetch`]: ViewController::complete_fetch

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::TimeGridResult;
use crate::event::{Event, Resource};
use crate::layout::{Layout, compute_layout};
use crate::normalize::normalize_events;
use crate::source::{EventSource, RawEvent};
use crate::tz::DisplayTimezone;
use crate::window::{Granularity, TimeWindow};

/// Refresh period of the now-indicator; the indicator has minute
/// resolution, matching the label grid.
pub const NOW_TICK_PERIOD: Duration = Duration::from_secs(60);

/// Non-blocking notices surfaced to the shell alongside the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FetchFailed(String),
}

/// One fully laid-out render cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub window: TimeWindow,
    pub layout: Layout,
}

/// A fetch the caller still has to run against an [`EventSource`].
#[derive(Debug, Clone)]
pub struct FetchTicket {
    seq: u64,
    pub window: TimeWindow,
    /// Active resource ids at issue time, in canonical (sorted) order.
    pub resource_ids: Vec<String>,
}

/// Cached events are keyed per (window range, resource), so toggling a
/// resource whose data is already present relayouts without a fetch.
type CacheKey = (DateTime<Utc>, DateTime<Utc>, String);

pub struct ViewController {
    granularity: Granularity,
    anchor: NaiveDate,
    timezone: DisplayTimezone,
    resources: Vec<Resource>,
    window: TimeWindow,
    cache: HashMap<CacheKey, Vec<Event>>,
    snapshot: Option<Snapshot>,
    notice: Option<Notice>,
    next_seq: u64,
    /// Sequence number of the outstanding fetch, if any. Completions with
    /// any other sequence are stale and discarded.
    pending_seq: Option<u64>,
    ticker: Option<NowTicker>,
}

impl ViewController {
    pub fn new(
        anchor: NaiveDate,
        granularity: Granularity,
        timezone: DisplayTimezone,
        resources: Vec<Resource>,
    ) -> Self {
        let window = TimeWindow::resolve(anchor, granularity, &timezone);
        ViewController {
            granularity,
            anchor,
            timezone,
            resources,
            window,
            cache: HashMap::new(),
            snapshot: None,
            notice: None,
            next_seq: 0,
            pending_seq: None,
            ticker: None,
        }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn timezone(&self) -> DisplayTimezone {
        self.timezone
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    // NAVIGATION:

    pub fn next(&mut self) -> Option<FetchTicket> {
        self.anchor = self.granularity.advance(self.anchor);
        self.refresh()
    }

    pub fn previous(&mut self) -> Option<FetchTicket> {
        self.anchor = self.granularity.retreat(self.anchor);
        self.refresh()
    }

    /// Reset the anchor to the current date without changing granularity.
    pub fn today(&mut self) -> Option<FetchTicket> {
        self.set_anchor(self.timezone.display_date(Utc::now()))
    }

    pub fn set_anchor(&mut self, anchor: NaiveDate) -> Option<FetchTicket> {
        self.anchor = anchor;
        self.refresh()
    }

    /// Switch view mode, recomputing the window from the same anchor. The
    /// now-ticker is torn down and restarted for the new mode.
    pub fn set_granularity(&mut self, granularity: Granularity) -> Option<FetchTicket> {
        self.granularity = granularity;
        if self.ticker.is_some() {
            self.start_now_ticker();
        }
        self.refresh()
    }

    /// Toggle a resource in or out of the layout. Relayouts immediately
    /// when the needed data is cached, otherwise issues a fetch.
    pub fn toggle_resource(&mut self, resource_id: &str) -> Option<FetchTicket> {
        if let Some(resource) = self.resources.iter_mut().find(|r| r.id == resource_id) {
            resource.active = !resource.active;
        } else {
            tracing::warn!(resource_id, "toggle for unknown resource ignored");
            return None;
        }
        self.refresh_without_resolving()
    }

    /// Change the display timezone. Stored instants and the fetch window
    /// are untouched; cached events are re-labeled and re-bucketed.
    pub fn set_timezone(&mut self, timezone: DisplayTimezone) {
        self.timezone = timezone;
        if self.ticker.is_some() {
            self.start_now_ticker();
        }
        if let Some(events) = self.cached_window_events() {
            self.apply_layout(&events);
        }
    }

    // FETCH CYCLE:

    /// Recompute the window, then relayout from cache or issue a fetch.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.window = TimeWindow::resolve(self.anchor, self.granularity, &self.timezone);
        self.refresh_without_resolving()
    }

    fn refresh_without_resolving(&mut self) -> Option<FetchTicket> {
        if let Some(events) = self.cached_window_events() {
            // Anything still in flight targets a window we no longer want.
            self.pending_seq = None;
            self.notice = None;
            self.apply_layout(&events);
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending_seq = Some(seq);
        Some(FetchTicket {
            seq,
            window: self.window.clone(),
            resource_ids: self.active_resource_ids(),
        })
    }

    /// Apply a completed fetch. Anything but the outstanding sequence is
    /// stale: the user navigated again before this response arrived, and it
    /// must not overwrite the newer window's layout.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, result: TimeGridResult<Vec<RawEvent>>) {
        if self.pending_seq != Some(ticket.seq) {
            tracing::debug!(seq = ticket.seq, "discarding stale fetch result");
            return;
        }
        self.pending_seq = None;

        match result {
            Ok(raw) => {
                let events = normalize_events(raw, &self.resources);
                for resource_id in &ticket.resource_ids {
                    let for_resource: Vec<Event> = events
                        .iter()
                        .filter(|e| &e.resource_id == resource_id)
                        .cloned()
                        .collect();
                    self.cache.insert(
                        (ticket.window.start, ticket.window.end, resource_id.clone()),
                        for_resource,
                    );
                }
                self.notice = None;
                self.apply_layout(&events);
            }
            Err(err) => {
                // Keep the last successfully laid-out state rather than
                // clearing the view.
                tracing::warn!(error = %err, "event fetch failed, retaining previous layout");
                self.notice = Some(Notice::FetchFailed(err.to_string()));
            }
        }
    }

    /// Issue and drive any needed fetch to completion against `source`.
    pub async fn sync<S: EventSource>(&mut self, source: &S) {
        if let Some(ticket) = self.refresh() {
            let result = source.fetch_events(&ticket.window, &ticket.resource_ids).await;
            self.complete_fetch(&ticket, result);
        }
    }

    // NOW-INDICATOR:

    /// Start (or restart) the periodic now-indicator task. Requires a tokio
    /// runtime; the task is aborted when the controller is dropped.
    pub fn start_now_ticker(&mut self) {
        self.ticker = Some(NowTicker::spawn(self.timezone, NOW_TICK_PERIOD));
    }

    pub fn stop_now_ticker(&mut self) {
        self.ticker = None;
    }

    /// Latest now-as-fraction-of-day value, if the ticker is running.
    pub fn now_fraction(&self) -> Option<f64> {
        self.ticker.as_ref().map(NowTicker::fraction)
    }

    // INTERNALS:

    fn active_resource_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .resources
            .iter()
            .filter(|r| r.active)
            .map(|r| r.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// All active resources' events for the current window, if every one of
    /// them is cached.
    fn cached_window_events(&self) -> Option<Vec<Event>> {
        let mut events = Vec::new();
        for resource_id in self.active_resource_ids() {
            let key = (self.window.start, self.window.end, resource_id);
            events.extend(self.cache.get(&key)?.iter().cloned());
        }
        Some(events)
    }

    fn apply_layout(&mut self, events: &[Event]) {
        let layout = compute_layout(events, &self.window, &self.resources, &self.timezone);
        self.snapshot = Some(Snapshot {
            window: self.window.clone(),
            layout,
        });
    }
}

/// Periodic now-indicator feed, decoupled from fetch and layout cycles.
///
/// Dropping the ticker aborts the task, which ties its lifetime to the
/// view: unmount or view-mode change replaces or drops it.
pub struct NowTicker {
    handle: JoinHandle<()>,
    rx: watch::Receiver<f64>,
}

impl NowTicker {
    pub fn spawn(tz: DisplayTimezone, period: Duration) -> Self {
        let (tx, rx) = watch::channel(tz.now_fraction(Utc::now()));
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if tx.send(tz.now_fraction(Utc::now())).is_err() {
                    break;
                }
            }
        });
        NowTicker { handle, rx }
    }

    /// Latest now-as-fraction-of-day value.
    pub fn fraction(&self) -> f64 {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.rx.clone()
    }
}

impl Drop for NowTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

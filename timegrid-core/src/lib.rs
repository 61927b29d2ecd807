//! Calendar aggregation and overlap-layout engine.
//!
//! timegrid-core merges events from multiple independently-synchronized
//! calendars into one deterministic, non-overlapping visual layout across
//! day/week/month views:
//!
//! - [`window`] resolves the `[start, end)` range and day list for a view
//! - [`normalize`] turns raw source events into canonical [`event::Event`]s
//! - [`layout`] buckets, clusters, lane-packs, and projects geometry
//! - [`tz`] converts absolute instants to display wall-clock values
//! - [`controller`] sequences navigation, fetching, and re-layout
//!
//! Event sources (remote calendar providers, local ICS directories) live
//! behind the [`source::EventSource`] port; renderers consume the
//! percentage boxes and month cells in [`layout::Layout`].

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod layout;
pub mod normalize;
pub mod source;
pub mod tz;
pub mod window;

pub use controller::{FetchTicket, Notice, Snapshot, ViewController};
pub use error::{TimeGridError, TimeGridResult};
pub use event::{Event, Resource};
pub use layout::{Layout, compute_layout};
pub use source::{EventSource, RawEvent};
pub use tz::DisplayTimezone;
pub use window::{Granularity, TimeWindow};

//! Greedy lane assignment within a cluster.
//!
//! First-fit packing over an ordered list of columns. Not guaranteed to hit
//! the chromatic minimum, but deterministic for identical input, which is
//! what keeps the UI stable across re-renders.

use crate::event::Event;
use crate::layout::cluster::{OverlapCluster, overlaps};

/// Lane placement for one event, plus the cluster-wide lane count every
/// member shares so geometry can divide the cluster's footprint evenly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneAssignment {
    pub event_id: String,
    pub lane: usize,
    pub lane_count: usize,
}

/// Assign every event in the cluster a lane such that overlapping events
/// never share one.
///
/// Events are processed in cluster order (already sorted by the grouper).
/// Each goes into the first column whose most-recently-placed event does
/// not overlap it; columns hold non-overlapping events by construction.
/// `O(n * k)` for `k` lanes used.
pub fn assign_lanes(cluster: &OverlapCluster) -> Vec<LaneAssignment> {
    let mut column_tails: Vec<&Event> = Vec::new();
    let mut lanes: Vec<usize> = Vec::with_capacity(cluster.events.len());

    for event in &cluster.events {
        let slot = column_tails
            .iter()
            .position(|tail| !overlaps(tail, event));

        match slot {
            Some(lane) => {
                column_tails[lane] = event;
                lanes.push(lane);
            }
            None => {
                column_tails.push(event);
                lanes.push(column_tails.len() - 1);
            }
        }
    }

    let lane_count = column_tails.len().max(1);

    cluster
        .events
        .iter()
        .zip(lanes)
        .map(|(event, lane)| LaneAssignment {
            event_id: event.id.clone(),
            lane,
            lane_count,
        })
        .collect()
}

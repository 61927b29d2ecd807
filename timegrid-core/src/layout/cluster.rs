//! Overlap grouping.
//!
//! Partitions the events of one (resource, day) bucket into clusters of
//! transitively-overlapping events. Clusters are what the column assigner
//! divides into lanes; two events in different clusters never constrain
//! each other's geometry.

use crate::event::Event;

/// A maximal set of events connected by transitive interval overlap within
/// one bucket. Recomputed every render cycle; no cross-cycle identity.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapCluster {
    pub events: Vec<Event>,
}

/// Half-open interval overlap: `[s1, e1)` and `[s2, e2)` overlap iff
/// `s1 < e2 && s2 < e1`. Back-to-back events sharing a boundary do not
/// overlap.
pub fn overlaps(a: &Event, b: &Event) -> bool {
    a.start < b.end && b.start < a.end
}

/// Partition one bucket into clusters ordered by earliest start.
///
/// Events are sorted by (start, end, id) so the scan, and everything
/// downstream of it, is deterministic. An event joins the current cluster
/// if it overlaps any member accumulated so far, not merely the previous
/// event; otherwise the cluster closes and a new one opens.
pub fn cluster_events(mut events: Vec<Event>) -> Vec<OverlapCluster> {
    events.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut clusters: Vec<OverlapCluster> = Vec::new();
    let mut current: Vec<Event> = Vec::new();

    for event in events {
        let joins = current.iter().any(|member| overlaps(member, &event));
        if !current.is_empty() && !joins {
            clusters.push(OverlapCluster {
                events: std::mem::take(&mut current),
            });
        }
        current.push(event);
    }

    if !current.is_empty() {
        clusters.push(OverlapCluster { events: current });
    }

    clusters
}

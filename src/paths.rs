use tracing::warn;

use crate::geometry::Point;
use crate::layout::FloorLayout;
use crate::model::{Connection, StateSnapshot};

/// A drawn connection between two zone centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    /// 0..=1, zero when the snapshot reports nothing for the connection.
    pub congestion: f64,
}

/// Resolve connections against the laid-out zones. Connections naming an
/// unknown zone are skipped; the second value counts them.
pub fn resolve_segments(
    edges: &[Connection],
    layout: &FloorLayout,
    state: &StateSnapshot,
) -> (Vec<Segment>, usize) {
    let mut segments = Vec::with_capacity(edges.len());
    let mut skipped = 0;

    for edge in edges {
        match (layout.get(&edge.from), layout.get(&edge.to)) {
            (Some(from), Some(to)) => segments.push(Segment {
                from: from.center(),
                to: to.center(),
                congestion: state.congestion_for(&edge.from, &edge.to).unwrap_or(0.0),
            }),
            _ => {
                warn!(from = %edge.from, to = %edge.to, "skipping connection to unknown zone");
                skipped += 1;
            }
        }
    }

    (segments, skipped)
}

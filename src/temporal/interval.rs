//! Interval relation inference.
//!
//! [`infer_relation`] maps two intervals onto one relation label. An absent
//! end means the interval is ongoing. The decision order below is fixed:
//! interval boundaries are frequently exactly equal and the first matching
//! rule decides the label.
//!
//! 1. Both ongoing: `equals`, `starts` or `during`.
//! 2. Only A ongoing: A's start is placed against B's span.
//! 3. Only B ongoing: B's start is placed against A's span.
//! 4. Both bounded: the full endpoint comparison.

use crate::catalog::TemporalRelation;
use crate::error::{Error, Result};
use crate::graph::Node;
use chrono::{DateTime, Utc};

/// Infer the relation `A r B`.
pub fn infer_relation(
    a_start: DateTime<Utc>,
    a_end: Option<DateTime<Utc>>,
    b_start: DateTime<Utc>,
    b_end: Option<DateTime<Utc>>,
) -> TemporalRelation {
    use TemporalRelation::*;

    match (a_end, b_end) {
        (None, None) => {
            if a_start == b_start {
                Equals
            } else if a_start < b_start {
                Starts
            } else {
                During
            }
        }
        (None, Some(b_end)) => {
            if a_start == b_start {
                Starts
            } else if b_start < a_start && a_start < b_end {
                During
            } else if a_start == b_end {
                Meets
            } else if a_start > b_end {
                After
            } else {
                Overlaps
            }
        }
        (Some(a_end), None) => {
            if a_start == b_start {
                StartedBy
            } else if a_start < b_start && b_start < a_end {
                During
            } else if b_start == a_end {
                Meets
            } else if b_start > a_end {
                Before
            } else {
                Overlaps
            }
        }
        (Some(a_end), Some(b_end)) => infer_bounded(a_start, a_end, b_start, b_end),
    }
}

fn infer_bounded(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> TemporalRelation {
    use TemporalRelation::*;

    if a_start == b_start && a_end == b_end {
        Equals
    } else if a_start < b_start && a_end > b_end {
        Contains
    } else if b_start < a_start && b_end > a_end {
        During
    } else if a_start == b_start && a_end < b_end {
        Starts
    } else if a_start == b_start {
        StartedBy
    } else if a_end == b_end && a_start > b_start {
        Finishes
    } else if a_end == b_end {
        FinishedBy
    } else if a_end < b_start {
        Before
    } else if a_start > b_end {
        After
    } else if a_end == b_start {
        Meets
    } else {
        Overlaps
    }
}

/// Infer the relation between two temporal entities.
///
/// Fails with `AmbiguousInterval` naming the first entity that has no start
/// time (including non-temporal nodes).
pub fn infer_between(a: &Node, b: &Node) -> Result<TemporalRelation> {
    let (a_start, a_end) = anchor(a)?;
    let (b_start, b_end) = anchor(b)?;
    Ok(infer_relation(a_start, a_end, b_start, b_end))
}

fn anchor(node: &Node) -> Result<(DateTime<Utc>, Option<DateTime<Utc>>)> {
    node.span()
        .and_then(|span| span.start.map(|start| (start, span.end)))
        .ok_or_else(|| Error::ambiguous_interval(&node.id))
}

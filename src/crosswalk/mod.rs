//! Honeycomb crosswalks: typed, weighted connections across axes.
//!
//! [`CrosswalkGenerator`] validates connection types against the relation
//! catalog, clamps strengths and creates edges idempotently. Axis fan-out
//! picks connection types by round-robin over per-axis strategies, so the
//! same graph and plan always produce the same edges.
//!
//! [`AffinityScorer`] suggests a connection type for a node pair from the
//! axis priority table, falling back to text heuristics.

mod affinity;
mod generator;

pub use affinity::{priority_connection, Affinity, AffinityBasis, AffinityScorer};
pub use generator::{
    ConnectOutcome, ConnectRequest, ConnectStatus, CrosswalkGenerator, Direction,
    FanoutPlan,
};

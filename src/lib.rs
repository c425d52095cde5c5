//! # honeycomb-core
//!
//! Relationship and temporal reasoning over a thirteen-axis knowledge graph.
//!
//! ## Core Components
//!
//! - **Catalog**: the fixed crosswalk connection types and interval relations
//! - **Graph**: typed nodes and edges behind the [`GraphStore`] seam
//! - **Path**: bounded, ranked simple-path search
//! - **Crosswalk**: idempotent honeycomb connections, affinity scoring and
//!   deterministic axis fan-out
//! - **Temporal**: interval relation inference, temporal relations and
//!   time-window queries
//!
//! ## Example
//!
//! ```rust,ignore
//! use honeycomb_core::{Axis, ConnectRequest, GraphEngine, GraphStore, Node};
//!
//! let engine = GraphEngine::in_memory();
//!
//! let pillar = Node::new(Axis::PillarLevel, "pillar").with_name("Medicine");
//! let sector = Node::new(Axis::Sector, "sector").with_name("Hospitals");
//! engine.store().insert_node(&pillar)?;
//! engine.store().insert_node(&sector)?;
//!
//! let outcome = engine.connect(ConnectRequest::new(pillar.id.clone(), sector.id.clone(), "direct_application", 0.9))?;
//! let paths = engine.find_paths(&pillar.id, &sector.id, None)?;
//! ```

pub mod catalog;
pub mod config;
pub mod crosswalk;
pub mod engine;
pub mod error;
pub mod graph;
pub mod path;
pub mod temporal;

// Re-exports for convenience
pub use catalog::{ConnectionType, RelationCatalog, TemporalRelation};
pub use config::EngineConfig;
pub use crosswalk::{
    Affinity, AffinityBasis, AffinityScorer, ConnectOutcome, ConnectRequest, ConnectStatus,
    CrosswalkGenerator, Direction, FanoutPlan,
};
pub use engine::GraphEngine;
pub use error::{Error, Result};
pub use graph::{
    Attributes, Axis, Edge, EdgeId, EdgeKind, GraphStore, InMemoryGraphStore, Node, NodeFilter,
    NodeId, NodeKind, SqliteGraphStore, TemporalPrecision, TemporalSpan, TimeWindow,
};
pub use path::{Path, PathFinder};
pub use temporal::{
    edge_valid_at, infer_relation, InferenceReport, InstalledEdge, TemporalEngine, TemporalLink,
    TimeBoundRelationships, TimeWindowQuery,
};

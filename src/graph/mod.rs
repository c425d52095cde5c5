//! Knowledge graph data model and storage.
//!
//! The graph module defines the typed node/edge model and the
//! [`GraphStore`] seam the reasoning engines consume:
//!
//! - **InMemoryGraphStore**: process-local store, insertion ordered
//! - **SqliteGraphStore**: durable store with an atomic insert-if-absent
//!
//! ## Example
//!
//! ```rust,ignore
//! use honeycomb_core::graph::{Axis, GraphStore, Node, NodeFilter, SqliteGraphStore};
//!
//! let store = SqliteGraphStore::in_memory()?;
//!
//! let sector = Node::new(Axis::Sector, "sector").with_name("Healthcare");
//! store.insert_node(&sector)?;
//!
//! let sectors = store.get_nodes_by_properties(&NodeFilter::new().axis(Axis::Sector), Some(10))?;
//! ```

mod schema;
mod sqlite;
mod store;
mod types;

pub use schema::{get_schema_version, initialize_schema, is_initialized, SCHEMA_VERSION};
pub use sqlite::{GraphStats, SqliteGraphStore};
pub use store::{GraphStore, InMemoryGraphStore, NodeFilter};
pub use types::{
    clamp_strength, Attributes, Axis, Edge, EdgeId, EdgeKind, Node, NodeId, NodeKind,
    TemporalPrecision, TemporalSpan, TimeWindow,
};

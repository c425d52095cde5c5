//! Temporal layer: interval inference, temporal relations and time-window
//! queries.
//!
//! - [`infer_relation`]: maps two (possibly ongoing) intervals onto one
//!   interval relation
//! - [`TemporalEngine`]: creates temporal entities and installs relation
//!   edges, with their inverses where one is defined
//! - [`TimeWindowQuery`]: read-only range, instant and timeline queries
//!
//! ## Example
//!
//! ```rust,ignore
//! use honeycomb_core::graph::{Attributes, InMemoryGraphStore, TemporalSpan};
//! use honeycomb_core::temporal::TemporalEngine;
//!
//! let store = InMemoryGraphStore::new();
//! let engine = TemporalEngine::new(&store);
//!
//! let a = engine.create_temporal_entity("project", TemporalSpan::bounded(jan1, jan10), Attributes::new())?;
//! let b = engine.create_temporal_entity("project", TemporalSpan::bounded(jan2, jan8), Attributes::new())?;
//!
//! // Installs a --contains--> b and b --during--> a
//! let link = engine.create_temporal_relationship(&a.id, &b.id, None)?;
//! ```

mod engine;
pub mod interval;
mod proptest;
mod window;

pub use engine::{edge_valid_at, InferenceReport, InstalledEdge, TemporalEngine, TemporalLink};
pub use interval::{infer_between, infer_relation};
pub use window::{TimeBoundRelationships, TimeWindowQuery};

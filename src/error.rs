//! Error types for honeycomb-core.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias using honeycomb-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during graph reasoning operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A referenced node does not exist in the store
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Relation name is not in the catalog (or collides with the other namespace)
    #[error("Invalid relation type: {name}")]
    InvalidRelationType { name: String },

    /// Temporal entity has no start time, so no relation can be inferred
    #[error("Ambiguous interval: entity {entity} has no start time")]
    AmbiguousInterval { entity: String },

    /// Interval ends before it starts
    #[error("Invalid interval: end {end} is before start {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Graph store (adapter) failure
    #[error("Graph store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a node-not-found error.
    pub fn node_not_found(id: impl ToString) -> Self {
        Self::NodeNotFound { id: id.to_string() }
    }

    /// Create an invalid relation type error.
    pub fn invalid_relation_type(name: impl Into<String>) -> Self {
        Self::InvalidRelationType { name: name.into() }
    }

    /// Create an ambiguous interval error.
    pub fn ambiguous_interval(entity: impl ToString) -> Self {
        Self::AmbiguousInterval {
            entity: entity.to_string(),
        }
    }

    /// Create an invalid interval error.
    pub fn invalid_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::InvalidInterval { start, end }
    }

    /// Create a store error from any displayable adapter failure.
    pub fn store(message: impl ToString) -> Self {
        Self::Store(message.to_string())
    }

    /// Whether this error only flags an unknown relation name.
    pub fn is_invalid_relation_type(&self) -> bool {
        matches!(self, Self::InvalidRelationType { .. })
    }
}

//! The graph store seam and an in-process implementation.
//!
//! The reasoning engine never owns node or edge state; it talks to a
//! [`GraphStore`]. Implementations are responsible for making
//! [`GraphStore::insert_edge_if_absent`] atomic.

use crate::error::{Error, Result};
use crate::graph::types::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Property filter for node lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeFilter {
    /// Filter by axis.
    pub axis: Option<Axis>,

    /// Filter by node type tag.
    pub node_type: Option<String>,

    /// Only temporal entities.
    pub temporal_only: bool,

    /// Attribute equality constraints.
    pub attributes: BTreeMap<String, Value>,
}

impl NodeFilter {
    /// Create a new empty filter (matches every node).
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by axis.
    pub fn axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Filter by node type tag.
    pub fn node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Only match temporal entities.
    pub fn temporal(mut self) -> Self {
        self.temporal_only = true;
        self
    }

    /// Require an attribute to equal `value`.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Check if a node matches this filter.
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(axis) = self.axis {
            if node.axis != axis {
                return false;
            }
        }

        if let Some(ref node_type) = self.node_type {
            if &node.node_type != node_type {
                return false;
            }
        }

        if self.temporal_only && !node.is_temporal() {
            return false;
        }

        self.attributes
            .iter()
            .all(|(k, v)| node.attributes.get(k) == Some(v))
    }
}

/// Backing store for nodes and edges.
///
/// Lookups return nodes and edges in a stable order (insertion order for the
/// built-in stores) so that callers iterating them stay deterministic.
pub trait GraphStore: Send + Sync {
    /// Get a node by ID.
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>>;

    /// Add a node to the store.
    fn insert_node(&self, node: &Node) -> Result<()>;

    /// Nodes matching `filter`, at most `limit` of them.
    fn get_nodes_by_properties(&self, filter: &NodeFilter, limit: Option<usize>)
        -> Result<Vec<Node>>;

    /// Insert `edge` unless an edge with the same `(source, target,
    /// edge_type)` already exists.
    ///
    /// Returns the stored edge and whether it was created by this call. An
    /// existing edge is returned unchanged. Check and insert must be one
    /// atomic step.
    fn insert_edge_if_absent(&self, edge: Edge) -> Result<(Edge, bool)>;

    /// Edges leaving `id`, optionally restricted to one edge type.
    fn get_outgoing_edges(&self, id: &NodeId, edge_type: Option<&str>) -> Result<Vec<Edge>>;

    /// Edges arriving at `id`, optionally restricted to one edge type.
    fn get_incoming_edges(&self, id: &NodeId, edge_type: Option<&str>) -> Result<Vec<Edge>>;

    /// Edges from `source` to `target`, optionally restricted to one edge type.
    fn get_edges_between(
        &self,
        source: &NodeId,
        target: &NodeId,
        edge_type: Option<&str>,
    ) -> Result<Vec<Edge>>;

    /// Fetch a node that must exist.
    fn require_node(&self, id: &NodeId) -> Result<Node> {
        self.get_node(id)?.ok_or_else(|| Error::node_not_found(id))
    }
}

type EdgeKey = (NodeId, NodeId, String);

#[derive(Default)]
struct Inner {
    nodes: Vec<Node>,
    node_index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<EdgeKey, usize>,
}

/// In-process graph store guarded by a single lock.
#[derive(Default)]
pub struct InMemoryGraphStore {
    inner: RwLock<Inner>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes stored.
    pub fn node_count(&self) -> Result<usize> {
        Ok(self.read()?.nodes.len())
    }

    /// Number of edges stored.
    pub fn edge_count(&self) -> Result<usize> {
        Ok(self.read()?.edges.len())
    }

    /// Snapshot of all edges in insertion order.
    pub fn all_edges(&self) -> Result<Vec<Edge>> {
        Ok(self.read()?.edges.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| Error::Internal(format!("Failed to lock graph store: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| Error::Internal(format!("Failed to lock graph store: {}", e)))
    }

    fn filter_edges<F>(&self, edge_type: Option<&str>, pred: F) -> Result<Vec<Edge>>
    where
        F: Fn(&Edge) -> bool,
    {
        let inner = self.read()?;
        Ok(inner
            .edges
            .iter()
            .filter(|e| edge_type.map_or(true, |t| e.edge_type() == t))
            .filter(|e| pred(e))
            .cloned()
            .collect())
    }
}

impl GraphStore for InMemoryGraphStore {
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        let inner = self.read()?;
        Ok(inner.node_index.get(id).map(|&i| inner.nodes[i].clone()))
    }

    fn insert_node(&self, node: &Node) -> Result<()> {
        let mut inner = self.write()?;
        if inner.node_index.contains_key(&node.id) {
            return Err(Error::store(format!("Node already exists: {}", node.id)));
        }
        let index = inner.nodes.len();
        inner.node_index.insert(node.id.clone(), index);
        inner.nodes.push(node.clone());
        Ok(())
    }

    fn get_nodes_by_properties(
        &self,
        filter: &NodeFilter,
        limit: Option<usize>,
    ) -> Result<Vec<Node>> {
        let inner = self.read()?;
        Ok(inner
            .nodes
            .iter()
            .filter(|n| filter.matches(n))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn insert_edge_if_absent(&self, edge: Edge) -> Result<(Edge, bool)> {
        let mut inner = self.write()?;
        let key = (
            edge.source.clone(),
            edge.target.clone(),
            edge.edge_type().to_string(),
        );
        if let Some(&i) = inner.edge_index.get(&key) {
            return Ok((inner.edges[i].clone(), false));
        }
        let index = inner.edges.len();
        inner.edge_index.insert(key, index);
        inner.edges.push(edge.clone());
        Ok((edge, true))
    }

    fn get_outgoing_edges(&self, id: &NodeId, edge_type: Option<&str>) -> Result<Vec<Edge>> {
        self.filter_edges(edge_type, |e| &e.source == id)
    }

    fn get_incoming_edges(&self, id: &NodeId, edge_type: Option<&str>) -> Result<Vec<Edge>> {
        self.filter_edges(edge_type, |e| &e.target == id)
    }

    fn get_edges_between(
        &self,
        source: &NodeId,
        target: &NodeId,
        edge_type: Option<&str>,
    ) -> Result<Vec<Edge>> {
        self.filter_edges(edge_type, |e| &e.source == source && &e.target == target)
    }
}

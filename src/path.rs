//! Bounded path search over the knowledge graph.
//!
//! Paths are found breadth-first over outgoing edges. A path never revisits a
//! node and never exceeds `max_depth` edges. Path strength is the product of
//! the crosswalk strengths along it; edges without a strength count as 1.0.
//!
//! Results are ranked by descending strength, then by fewer edges, then by
//! discovery order, so the same graph always yields the same list.

use crate::error::Result;
use crate::graph::{Edge, EdgeId, GraphStore, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, instrument};

/// A simple path between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Nodes from source to target.
    pub nodes: Vec<NodeId>,

    /// Edges traversed, one fewer than `nodes`.
    pub edges: Vec<EdgeId>,

    /// Product of edge strengths.
    pub strength: f64,
}

impl Path {
    /// The single-node path.
    pub fn trivial(node: NodeId) -> Self {
        Self {
            nodes: vec![node],
            edges: Vec::new(),
            strength: 1.0,
        }
    }

    /// Number of edges in the path.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn source(&self) -> Option<&NodeId> {
        self.nodes.first()
    }

    pub fn target(&self) -> Option<&NodeId> {
        self.nodes.last()
    }

    fn extend(&self, edge: &Edge) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(edge.target.clone());
        let mut edges = self.edges.clone();
        edges.push(edge.id.clone());
        Self {
            nodes,
            edges,
            strength: self.strength * edge.strength().unwrap_or(1.0),
        }
    }
}

/// Breadth-first path finder over a graph store.
pub struct PathFinder<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    max_paths: Option<usize>,
}

impl<'a, S: GraphStore + ?Sized> PathFinder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            max_paths: None,
        }
    }

    /// Keep only the best `max_paths` results.
    pub fn with_max_paths(mut self, max_paths: Option<usize>) -> Self {
        self.max_paths = max_paths;
        self
    }

    /// Find all simple paths from `source` to `target` of at most
    /// `max_depth` edges, ranked.
    ///
    /// Returns `NodeNotFound` if either endpoint is missing. An empty list
    /// means no path exists within the depth bound.
    #[instrument(skip(self, source, target), fields(source = %source, target = %target))]
    pub fn find_paths(
        &self,
        source: &NodeId,
        target: &NodeId,
        max_depth: usize,
    ) -> Result<Vec<Path>> {
        self.store.require_node(source)?;
        self.store.require_node(target)?;

        if source == target {
            return Ok(vec![Path::trivial(source.clone())]);
        }

        // Adjacency is fetched once per node so one search sees one snapshot
        let mut adjacency: HashMap<NodeId, Vec<Edge>> = HashMap::new();
        let mut queue = VecDeque::from([Path::trivial(source.clone())]);
        let mut found = Vec::new();

        while let Some(partial) = queue.pop_front() {
            if partial.len() >= max_depth {
                continue;
            }
            let Some(tail) = partial.target().cloned() else {
                continue;
            };

            if !adjacency.contains_key(&tail) {
                let edges = self.store.get_outgoing_edges(&tail, None)?;
                adjacency.insert(tail.clone(), edges);
            }

            for edge in adjacency.get(&tail).into_iter().flatten() {
                if partial.nodes.contains(&edge.target) {
                    continue;
                }
                let next = partial.extend(edge);
                if &edge.target == target {
                    found.push(next);
                } else {
                    queue.push_back(next);
                }
            }
        }

        if found.is_empty() {
            debug!(max_depth, "No path within depth bound");
        }

        rank_paths(&mut found);
        if let Some(max) = self.max_paths {
            found.truncate(max);
        }

        debug!(paths = found.len(), "Path search complete");
        Ok(found)
    }

    /// The best-ranked path, if any.
    pub fn strongest_path(
        &self,
        source: &NodeId,
        target: &NodeId,
        max_depth: usize,
    ) -> Result<Option<Path>> {
        Ok(self.find_paths(source, target, max_depth)?.into_iter().next())
    }
}

/// Sort by descending strength, then fewer edges. The sort is stable, so
/// remaining ties keep discovery order.
fn rank_paths(paths: &mut [Path]) {
    paths.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| a.len().cmp(&b.len()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ConnectionType;
    use crate::graph::{Axis, EdgeKind, InMemoryGraphStore, Node};
    use std::collections::HashSet;

    struct Fixture {
        store: InMemoryGraphStore,
        ids: Vec<NodeId>,
    }

    impl Fixture {
        fn new(count: usize) -> Self {
            let store = InMemoryGraphStore::new();
            let ids = (0..count)
                .map(|i| {
                    let node = Node::new(Axis::Node, "node").with_attribute("index", i);
                    store.insert_node(&node).unwrap();
                    node.id
                })
                .collect();
            Self { store, ids }
        }

        fn link(&self, from: usize, to: usize, strength: f64) {
            self.store
                .insert_edge_if_absent(Edge::new(
                    self.ids[from].clone(),
                    self.ids[to].clone(),
                    EdgeKind::crosswalk(ConnectionType::CrosswalksTo, strength),
                ))
                .unwrap();
        }

        fn plain(&self, from: usize, to: usize) {
            self.store
                .insert_edge_if_absent(Edge::new(
                    self.ids[from].clone(),
                    self.ids[to].clone(),
                    EdgeKind::Relationship {
                        edge_type: "references".to_string(),
                    },
                ))
                .unwrap();
        }

        fn finder(&self) -> PathFinder<'_, InMemoryGraphStore> {
            PathFinder::new(&self.store)
        }
    }

    #[test]
    fn test_trivial_path() {
        let fx = Fixture::new(2);
        fx.link(0, 1, 0.5);

        let paths = fx.finder().find_paths(&fx.ids[0], &fx.ids[0], 3).unwrap();
        assert_eq!(paths, vec![Path::trivial(fx.ids[0].clone())]);
        assert_eq!(paths[0].strength, 1.0);
    }

    #[test]
    fn test_missing_endpoint() {
        let fx = Fixture::new(1);
        let err = fx
            .finder()
            .find_paths(&fx.ids[0], &NodeId::new(), 3)
            .unwrap_err();
        assert!(matches!(err, crate::Error::NodeNotFound { .. }));
    }

    #[test]
    fn test_ranked_by_strength_then_length() {
        // 0 -> 1 -> 3 (0.9 * 0.9 = 0.81)
        // 0 -> 3       (0.5)
        // 0 -> 2 -> 3 (1.0 * 0.5 = 0.5, longer than the direct edge)
        let fx = Fixture::new(4);
        fx.link(0, 1, 0.9);
        fx.link(1, 3, 0.9);
        fx.link(0, 3, 0.5);
        fx.link(0, 2, 1.0);
        fx.link(2, 3, 0.5);

        let paths = fx.finder().find_paths(&fx.ids[0], &fx.ids[3], 3).unwrap();
        assert_eq!(paths.len(), 3);
        assert!((paths[0].strength - 0.81).abs() < 1e-9);
        assert_eq!(paths[0].nodes, vec![fx.ids[0].clone(), fx.ids[1].clone(), fx.ids[3].clone()]);
        assert_eq!(paths[1].len(), 1);
        assert_eq!(paths[2].len(), 2);
        assert_eq!(paths[2].nodes[1], fx.ids[2]);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let fx = Fixture::new(4);
        fx.link(0, 1, 0.5);
        fx.link(0, 2, 0.5);
        fx.link(1, 3, 1.0);
        fx.link(2, 3, 1.0);

        let paths = fx.finder().find_paths(&fx.ids[0], &fx.ids[3], 2).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].nodes[1], fx.ids[1]);
        assert_eq!(paths[1].nodes[1], fx.ids[2]);
    }

    #[test]
    fn test_depth_bound() {
        let fx = Fixture::new(4);
        fx.link(0, 1, 1.0);
        fx.link(1, 2, 1.0);
        fx.link(2, 3, 1.0);

        assert!(fx
            .finder()
            .find_paths(&fx.ids[0], &fx.ids[3], 2)
            .unwrap()
            .is_empty());
        assert_eq!(
            fx.finder()
                .find_paths(&fx.ids[0], &fx.ids[3], 3)
                .unwrap()
                .len(),
            1
        );
        assert!(fx
            .finder()
            .find_paths(&fx.ids[0], &fx.ids[1], 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_cycles_are_not_followed() {
        let fx = Fixture::new(4);
        fx.link(0, 1, 1.0);
        fx.link(1, 2, 1.0);
        fx.link(2, 0, 1.0);
        fx.link(2, 1, 1.0);
        fx.link(2, 3, 1.0);

        let paths = fx.finder().find_paths(&fx.ids[0], &fx.ids[3], 10).unwrap();
        assert_eq!(paths.len(), 1);
        for path in &paths {
            let unique: HashSet<_> = path.nodes.iter().collect();
            assert_eq!(unique.len(), path.nodes.len());
            assert!(path.len() <= 10);
        }
    }

    #[test]
    fn test_plain_edges_do_not_penalize() {
        let fx = Fixture::new(3);
        fx.plain(0, 1);
        fx.link(1, 2, 0.6);

        let path = fx
            .finder()
            .strongest_path(&fx.ids[0], &fx.ids[2], 4)
            .unwrap()
            .unwrap();
        assert!((path.strength - 0.6).abs() < 1e-9);
        assert_eq!(path.edges.len(), 2);
    }

    #[test]
    fn test_max_paths_cap() {
        let fx = Fixture::new(5);
        for mid in 1..4 {
            fx.link(0, mid, 0.2 * mid as f64);
            fx.link(mid, 4, 1.0);
        }

        let paths = fx
            .finder()
            .with_max_paths(Some(2))
            .find_paths(&fx.ids[0], &fx.ids[4], 2)
            .unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].nodes[1], fx.ids[3]);
    }
}

//! Temporal Relation Engine: temporal entities and the edges between them.

use crate::catalog::{RelationCatalog, TemporalRelation};
use crate::crosswalk::ConnectStatus;
use crate::error::{Error, Result};
use crate::graph::{Attributes, Edge, EdgeKind, GraphStore, Node, NodeFilter, NodeId, TemporalSpan, TimeWindow};
use crate::temporal::interval::infer_between;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// An edge together with whether this call created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledEdge {
    pub edge: Edge,
    pub status: ConnectStatus,
}

impl InstalledEdge {
    fn new(edge: Edge, created: bool) -> Self {
        let status = if created {
            ConnectStatus::Created
        } else {
            ConnectStatus::AlreadyExists
        };
        Self { edge, status }
    }

    pub fn created(&self) -> bool {
        self.status == ConnectStatus::Created
    }
}

/// Result of installing a temporal relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalLink {
    pub relation: TemporalRelation,
    /// `A --relation--> B`.
    pub forward: InstalledEdge,
    /// `B --inverse--> A`, for relations that install their inverse.
    pub inverse: Option<InstalledEdge>,
}

/// Outcome of inferring relations for one entity against all others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceReport {
    /// Edges created by this run, forward and inverse.
    pub created: Vec<Edge>,
    /// Peers already related to the entity.
    pub already_related: Vec<NodeId>,
    /// Peers without a start time.
    pub skipped: Vec<NodeId>,
}

/// Whether `edge` holds at `instant`. Edges without a validity window always do.
pub fn edge_valid_at(edge: &Edge, instant: DateTime<Utc>) -> bool {
    edge.valid_at(instant)
}

/// Creates temporal entities and interval relations through a graph store.
pub struct TemporalEngine<'a, S: GraphStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GraphStore + ?Sized> TemporalEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create and store a temporal entity.
    ///
    /// The duration is recomputed from the endpoints when both are known.
    /// Fails with `InvalidInterval` if the span ends before it starts.
    pub fn create_temporal_entity(
        &self,
        node_type: impl Into<String>,
        span: TemporalSpan,
        attributes: Attributes,
    ) -> Result<Node> {
        let span = match (span.start, span.end) {
            (Some(start), Some(end)) if end < start => {
                return Err(Error::invalid_interval(start, end))
            }
            (Some(start), Some(end)) => {
                TemporalSpan::bounded(start, end).with_precision(span.precision)
            }
            _ => span,
        };

        let mut node = Node::temporal(node_type, span);
        node.attributes.extend(attributes);
        self.store.insert_node(&node)?;

        debug!(entity = %node.id, node_type = %node.node_type, "Created temporal entity");
        Ok(node)
    }

    /// Install `A --relation--> B`, inferring the relation when none is given.
    ///
    /// Inferred relations are tagged `inferred`. For before, after, during and
    /// contains the inverse edge `B --inverse--> A` is installed as well.
    /// Both installs are idempotent.
    #[instrument(skip(self, a, b), fields(a = %a, b = %b))]
    pub fn create_temporal_relationship(
        &self,
        a: &NodeId,
        b: &NodeId,
        relation: Option<TemporalRelation>,
    ) -> Result<TemporalLink> {
        let node_a = self.store.require_node(a)?;
        let node_b = self.store.require_node(b)?;

        let (relation, inferred) = match relation {
            Some(relation) => (relation, false),
            None => (infer_between(&node_a, &node_b)?, true),
        };

        self.install(a, b, relation, inferred)
    }

    fn install(
        &self,
        a: &NodeId,
        b: &NodeId,
        relation: TemporalRelation,
        inferred: bool,
    ) -> Result<TemporalLink> {
        let (edge, created) = self.store.insert_edge_if_absent(Edge::new(
            a.clone(),
            b.clone(),
            EdgeKind::Temporal { relation, inferred },
        ))?;
        let forward = InstalledEdge::new(edge, created);

        let inverse = if relation.installs_inverse() {
            let (edge, created) = self.store.insert_edge_if_absent(Edge::new(
                b.clone(),
                a.clone(),
                EdgeKind::Temporal {
                    relation: relation.inverse(),
                    inferred,
                },
            ))?;
            Some(InstalledEdge::new(edge, created))
        } else {
            None
        };

        debug!(%relation, created = forward.created(), "Installed temporal relation");
        Ok(TemporalLink {
            relation,
            forward,
            inverse,
        })
    }

    /// Infer and install relations between `entity` and every other temporal
    /// entity that has no temporal edge from `entity` yet.
    ///
    /// Fails with `AmbiguousInterval` if `entity` itself has no start time.
    /// Peers without one are reported in `skipped`.
    #[instrument(skip(self, entity), fields(entity = %entity))]
    pub fn infer_temporal_relations(&self, entity: &NodeId) -> Result<InferenceReport> {
        let node = self.store.require_node(entity)?;
        if node.span().and_then(|s| s.start).is_none() {
            return Err(Error::ambiguous_interval(entity));
        }

        let peers = self
            .store
            .get_nodes_by_properties(&NodeFilter::new().temporal(), None)?;

        let mut report = InferenceReport::default();
        for peer in peers.iter().filter(|p| p.id != node.id) {
            let existing = self.store.get_edges_between(entity, &peer.id, None)?;
            if existing.iter().any(|e| e.relation().is_some()) {
                report.already_related.push(peer.id.clone());
                continue;
            }

            let relation = match infer_between(&node, peer) {
                Ok(relation) => relation,
                Err(Error::AmbiguousInterval { .. }) => {
                    debug!(peer = %peer.id, "Peer has no start time, skipping");
                    report.skipped.push(peer.id.clone());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let link = self.install(entity, &peer.id, relation, true)?;
            for installed in std::iter::once(link.forward).chain(link.inverse) {
                if installed.created() {
                    report.created.push(installed.edge);
                }
            }
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Temporal inference complete"
        );
        Ok(report)
    }

    /// Connect two arbitrary nodes with an edge valid only in `[start, end]`.
    ///
    /// `edge_type` must lie outside both catalogs; crosswalk and temporal
    /// names fail with `InvalidRelationType`.
    pub fn create_time_bound_relationship(
        &self,
        source: &NodeId,
        target: &NodeId,
        edge_type: impl Into<String>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        attributes: Attributes,
    ) -> Result<InstalledEdge> {
        let edge_type = edge_type.into();
        if edge_type.trim().is_empty()
            || RelationCatalog::is_valid_crosswalk_type(&edge_type)
            || RelationCatalog::is_valid_temporal_type(&edge_type)
        {
            return Err(Error::invalid_relation_type(edge_type));
        }
        if let Some(end) = end {
            if end < start {
                return Err(Error::invalid_interval(start, end));
            }
        }
        self.store.require_node(source)?;
        self.store.require_node(target)?;

        let edge = Edge::new(
            source.clone(),
            target.clone(),
            EdgeKind::Relationship { edge_type },
        )
        .with_validity(TimeWindow::new(start, end))
        .with_attributes(attributes);

        let (edge, created) = self.store.insert_edge_if_absent(edge)?;
        Ok(InstalledEdge::new(edge, created))
    }

    /// Temporal edges leaving `entity`, optionally of one relation.
    pub fn temporal_relations(
        &self,
        entity: &NodeId,
        relation: Option<TemporalRelation>,
    ) -> Result<Vec<Edge>> {
        self.store.require_node(entity)?;
        let edges = self
            .store
            .get_outgoing_edges(entity, relation.map(|r| r.as_str()))?;
        Ok(edges
            .into_iter()
            .filter(|e| e.relation().is_some())
            .collect())
    }
}

//! Crosswalk generation: creating honeycomb connections between nodes.

use crate::catalog::{ConnectionType, RelationCatalog};
use crate::config::EngineConfig;
use crate::crosswalk::affinity::{Affinity, AffinityScorer};
use crate::error::Result;
use crate::graph::{Attributes, Axis, Edge, EdgeKind, GraphStore, NodeFilter, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Whether a connect call created a new edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectStatus {
    Created,
    AlreadyExists,
}

impl std::fmt::Display for ConnectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::AlreadyExists => write!(f, "already_exists"),
        }
    }
}

/// Result of a connect call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectOutcome {
    /// The stored edge (the pre-existing one for `AlreadyExists`).
    pub edge: Edge,
    pub status: ConnectStatus,
    /// The connection type is outside the catalog.
    pub custom_type: bool,
}

impl ConnectOutcome {
    pub fn created(&self) -> bool {
        self.status == ConnectStatus::Created
    }
}

/// Request to connect two nodes.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub source: NodeId,
    pub target: NodeId,
    pub connection_type: String,
    pub strength: f64,
    pub attributes: Attributes,
    /// Accept a connection type outside the catalog for this call.
    pub allow_custom_type: bool,
}

impl ConnectRequest {
    pub fn new(
        source: NodeId,
        target: NodeId,
        connection_type: impl Into<String>,
        strength: f64,
    ) -> Self {
        Self {
            source,
            target,
            connection_type: connection_type.into(),
            strength,
            attributes: Attributes::new(),
            allow_custom_type: false,
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Opt in to connection types outside the catalog.
    pub fn allow_custom_type(mut self) -> Self {
        self.allow_custom_type = true;
        self
    }
}

/// Which edges to list around a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// Plan for fanning a node out to the other twelve axes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FanoutPlan {
    /// Candidates fetched per axis; missing axes use the configured default.
    pub per_axis_budget: BTreeMap<Axis, usize>,

    /// Connection types rotated through per axis; missing axes use
    /// [`Axis::default_strategies`].
    pub strategies: BTreeMap<Axis, Vec<ConnectionType>>,

    /// Strength for every created edge; defaults to the configured strength.
    pub strength: Option<f64>,

    /// Stop once this many connections have been made.
    pub max_connections: Option<usize>,

    /// Accept strategies outside the catalog for this fan-out.
    #[serde(default)]
    pub allow_custom_types: bool,
}

impl FanoutPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidate budget for one axis.
    pub fn budget(mut self, axis: Axis, budget: usize) -> Self {
        self.per_axis_budget.insert(axis, budget);
        self
    }

    /// Set the rotation of connection types for one axis.
    pub fn strategies(mut self, axis: Axis, strategies: Vec<ConnectionType>) -> Self {
        self.strategies.insert(axis, strategies);
        self
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Opt in to strategies outside the catalog.
    pub fn allow_custom_types(mut self) -> Self {
        self.allow_custom_types = true;
        self
    }
}

/// Creates honeycomb connections through a graph store.
pub struct CrosswalkGenerator<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    config: &'a EngineConfig,
    scorer: AffinityScorer,
}

impl<'a, S: GraphStore + ?Sized> CrosswalkGenerator<'a, S> {
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self {
            store,
            config,
            scorer: AffinityScorer::new(config),
        }
    }

    /// The affinity scorer in use.
    pub fn scorer(&self) -> &AffinityScorer {
        &self.scorer
    }

    /// Connect two nodes.
    ///
    /// Strength is clamped to [0, 1]. If an edge with the same source,
    /// target and connection type exists it is returned unchanged with
    /// status `AlreadyExists`. Unknown connection types fail with
    /// `InvalidRelationType` unless custom types are allowed, in which case
    /// they are accepted and flagged.
    #[instrument(skip(self, request), fields(connection_type = %request.connection_type))]
    pub fn connect(&self, request: ConnectRequest) -> Result<ConnectOutcome> {
        let allow_custom = request.allow_custom_type || self.config.allow_custom_types;
        let connection_type =
            RelationCatalog::parse_crosswalk(&request.connection_type, allow_custom)?;

        self.connect_typed(
            &request.source,
            &request.target,
            connection_type,
            request.strength,
            request.attributes,
        )
    }

    fn connect_typed(
        &self,
        source: &NodeId,
        target: &NodeId,
        connection_type: ConnectionType,
        strength: f64,
        attributes: Attributes,
    ) -> Result<ConnectOutcome> {
        self.store.require_node(source)?;
        self.store.require_node(target)?;

        let custom_type = connection_type.is_custom();
        if custom_type {
            warn!(
                connection_type = %connection_type,
                "Connection type is not in the catalog, proceeding as custom"
            );
        }

        let edge = Edge::new(
            source.clone(),
            target.clone(),
            EdgeKind::crosswalk(connection_type, strength),
        )
        .with_attributes(attributes);

        let (edge, created) = self.store.insert_edge_if_absent(edge)?;
        let status = if created {
            ConnectStatus::Created
        } else {
            ConnectStatus::AlreadyExists
        };
        debug!(edge = %edge.id, %status, "Crosswalk connect");

        Ok(ConnectOutcome {
            edge,
            status,
            custom_type,
        })
    }

    /// Suggest a connection for `a -> b`.
    pub fn score_affinity(&self, a: &NodeId, b: &NodeId) -> Result<Affinity> {
        let a = self.store.require_node(a)?;
        let b = self.store.require_node(b)?;
        Ok(self.scorer.score(&a, &b))
    }

    /// Score a pair and connect it with the suggested type and strength.
    pub fn connect_by_affinity(&self, a: &NodeId, b: &NodeId) -> Result<ConnectOutcome> {
        let affinity = self.score_affinity(a, b)?;
        let attributes = affinity_attributes(&affinity);
        self.connect_typed(a, b, affinity.connection_type, affinity.strength, attributes)
    }

    /// Connect `source` to up to `limit` nodes on `axis`, each with its
    /// scored affinity.
    #[instrument(skip(self, source), fields(source = %source))]
    pub fn crosswalk_to_axis(
        &self,
        source: &NodeId,
        axis: Axis,
        limit: usize,
    ) -> Result<Vec<ConnectOutcome>> {
        let origin = self.store.require_node(source)?;
        let candidates = self
            .store
            .get_nodes_by_properties(&NodeFilter::new().axis(axis), Some(limit.saturating_add(1)))?;

        let mut outcomes = Vec::new();
        for candidate in candidates
            .iter()
            .filter(|c| c.id != origin.id)
            .take(limit)
        {
            let affinity = self.scorer.score(&origin, candidate);
            let attributes = affinity_attributes(&affinity);
            outcomes.push(self.connect_typed(
                &origin.id,
                &candidate.id,
                affinity.connection_type,
                affinity.strength,
                attributes,
            )?);
        }

        info!(connections = outcomes.len(), "Crosswalked node to axis {}", axis);
        Ok(outcomes)
    }

    /// Fan `center` out to every other axis.
    ///
    /// For each axis other than the center's own, up to the axis budget of
    /// candidates is fetched in store order. The connection type for each
    /// candidate is the axis strategy at `connections_made % strategies.len()`,
    /// so identical inputs always produce identical edges.
    #[instrument(skip(self, center, plan), fields(center = %center))]
    pub fn generate_axis_fanout(
        &self,
        center: &NodeId,
        plan: &FanoutPlan,
    ) -> Result<Vec<ConnectOutcome>> {
        let center_node = self.store.require_node(center)?;
        let strength = plan.strength.unwrap_or(self.config.default_strength);
        let max_connections = plan.max_connections.unwrap_or(usize::MAX);

        // Resolve every strategy before writing any edge
        let allow_custom = plan.allow_custom_types || self.config.allow_custom_types;
        let mut rotations: Vec<(Axis, Vec<ConnectionType>)> = Vec::new();
        for axis in Axis::ALL.into_iter().filter(|a| *a != center_node.axis) {
            let strategies = match plan.strategies.get(&axis) {
                Some(strategies) => strategies
                    .iter()
                    .map(|t| RelationCatalog::parse_crosswalk(t.as_str(), allow_custom))
                    .collect::<Result<Vec<_>>>()?,
                None => axis.default_strategies(),
            };
            rotations.push((axis, strategies));
        }

        let mut outcomes: Vec<ConnectOutcome> = Vec::new();

        for (axis, strategies) in rotations {
            if outcomes.len() >= max_connections {
                break;
            }

            let budget = plan
                .per_axis_budget
                .get(&axis)
                .copied()
                .unwrap_or(self.config.default_per_axis_budget);
            if budget == 0 {
                continue;
            }

            if strategies.is_empty() {
                debug!(%axis, "No strategies for axis, skipping");
                continue;
            }

            let candidates = self
                .store
                .get_nodes_by_properties(&NodeFilter::new().axis(axis), Some(budget))?;

            for candidate in &candidates {
                if outcomes.len() >= max_connections {
                    break;
                }
                let connection_type = strategies[outcomes.len() % strategies.len()].clone();

                let mut attributes = Attributes::new();
                attributes.insert("fanout".into(), true.into());
                attributes.insert("target_axis".into(), axis.number().into());

                outcomes.push(self.connect_typed(
                    center,
                    &candidate.id,
                    connection_type,
                    strength,
                    attributes,
                )?);
            }
        }

        let created = outcomes.iter().filter(|o| o.created()).count();
        info!(
            connections = outcomes.len(),
            created, "Axis fan-out complete"
        );
        Ok(outcomes)
    }

    /// Honeycomb edges around `node`, optionally of one connection type.
    pub fn connections(
        &self,
        node: &NodeId,
        direction: Direction,
        connection_type: Option<&ConnectionType>,
    ) -> Result<Vec<Edge>> {
        self.store.require_node(node)?;
        let type_name = connection_type.map(|t| t.as_str());

        let mut edges = Vec::new();
        if matches!(direction, Direction::Outgoing | Direction::Both) {
            edges.extend(self.store.get_outgoing_edges(node, type_name)?);
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            edges.extend(self.store.get_incoming_edges(node, type_name)?);
        }

        edges.retain(|e| matches!(e.kind, EdgeKind::Crosswalk { .. }));
        Ok(edges)
    }
}

fn affinity_attributes(affinity: &Affinity) -> Attributes {
    let mut attributes = Attributes::new();
    if let Ok(basis) = serde_json::to_value(affinity.basis) {
        attributes.insert("affinity_basis".into(), basis);
    }
    attributes
}

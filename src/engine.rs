//! The engine facade handed to axis handlers.
//!
//! [`GraphEngine`] holds a shared handle to a [`GraphStore`] and an
//! [`EngineConfig`]. It owns no graph state of its own; every call builds the
//! component it needs over the store and returns.

use crate::catalog::{RelationCatalog, TemporalRelation};
use crate::config::EngineConfig;
use crate::crosswalk::{
    Affinity, ConnectOutcome, ConnectRequest, CrosswalkGenerator, Direction, FanoutPlan,
};
use crate::catalog::ConnectionType;
use crate::error::Result;
use crate::graph::{Attributes, Axis, Edge, GraphStore, InMemoryGraphStore, Node, NodeId, TemporalSpan};
use crate::path::{Path, PathFinder};
use crate::temporal::{
    InferenceReport, InstalledEdge, TemporalEngine, TemporalLink, TimeBoundRelationships,
    TimeWindowQuery,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Reasoning engine over a shared graph store.
pub struct GraphEngine<S: GraphStore> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: GraphStore> Clone for GraphEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl GraphEngine<InMemoryGraphStore> {
    /// Engine over a fresh in-memory store with the default configuration.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryGraphStore::new()))
    }
}

impl<S: GraphStore> GraphEngine<S> {
    /// Create an engine with the default configuration.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine with a validated configuration.
    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn crosswalk(&self) -> CrosswalkGenerator<'_, S> {
        CrosswalkGenerator::new(self.store.as_ref(), &self.config)
    }

    fn temporal(&self) -> TemporalEngine<'_, S> {
        TemporalEngine::new(self.store.as_ref())
    }

    fn window(&self) -> TimeWindowQuery<'_, S> {
        TimeWindowQuery::new(self.store.as_ref())
    }

    // Catalog

    /// Description of a crosswalk or temporal relation name.
    pub fn describe_relation(&self, name: &str) -> Result<&'static str> {
        RelationCatalog::describe(name)
    }

    // Crosswalks

    pub fn connect(&self, request: ConnectRequest) -> Result<ConnectOutcome> {
        self.crosswalk().connect(request)
    }

    pub fn generate_axis_fanout(
        &self,
        center: &NodeId,
        plan: &FanoutPlan,
    ) -> Result<Vec<ConnectOutcome>> {
        self.crosswalk().generate_axis_fanout(center, plan)
    }

    pub fn score_affinity(&self, a: &NodeId, b: &NodeId) -> Result<Affinity> {
        self.crosswalk().score_affinity(a, b)
    }

    pub fn connect_by_affinity(&self, a: &NodeId, b: &NodeId) -> Result<ConnectOutcome> {
        self.crosswalk().connect_by_affinity(a, b)
    }

    pub fn crosswalk_to_axis(
        &self,
        source: &NodeId,
        axis: Axis,
        limit: usize,
    ) -> Result<Vec<ConnectOutcome>> {
        self.crosswalk().crosswalk_to_axis(source, axis, limit)
    }

    pub fn connections(
        &self,
        node: &NodeId,
        direction: Direction,
        connection_type: Option<&ConnectionType>,
    ) -> Result<Vec<Edge>> {
        self.crosswalk().connections(node, direction, connection_type)
    }

    // Paths

    /// Ranked simple paths; `max_depth` defaults to the configured depth.
    pub fn find_paths(
        &self,
        source: &NodeId,
        target: &NodeId,
        max_depth: Option<usize>,
    ) -> Result<Vec<Path>> {
        self.path_finder().find_paths(
            source,
            target,
            max_depth.unwrap_or(self.config.default_max_depth),
        )
    }

    pub fn strongest_path(
        &self,
        source: &NodeId,
        target: &NodeId,
        max_depth: Option<usize>,
    ) -> Result<Option<Path>> {
        self.path_finder().strongest_path(
            source,
            target,
            max_depth.unwrap_or(self.config.default_max_depth),
        )
    }

    fn path_finder(&self) -> PathFinder<'_, S> {
        PathFinder::new(self.store.as_ref()).with_max_paths(self.config.max_paths)
    }

    // Temporal

    pub fn create_temporal_entity(
        &self,
        node_type: impl Into<String>,
        span: TemporalSpan,
        attributes: Attributes,
    ) -> Result<Node> {
        self.temporal()
            .create_temporal_entity(node_type, span, attributes)
    }

    /// Install a temporal relation given by name, or inferred when `None`.
    pub fn create_temporal_relationship(
        &self,
        a: &NodeId,
        b: &NodeId,
        relation: Option<&str>,
    ) -> Result<TemporalLink> {
        let relation = relation.map(RelationCatalog::parse_temporal).transpose()?;
        self.temporal().create_temporal_relationship(a, b, relation)
    }

    pub fn infer_temporal_relations(&self, entity: &NodeId) -> Result<InferenceReport> {
        self.temporal().infer_temporal_relations(entity)
    }

    pub fn create_time_bound_relationship(
        &self,
        source: &NodeId,
        target: &NodeId,
        edge_type: impl Into<String>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        attributes: Attributes,
    ) -> Result<InstalledEdge> {
        self.temporal()
            .create_time_bound_relationship(source, target, edge_type, start, end, attributes)
    }

    pub fn temporal_relations(
        &self,
        entity: &NodeId,
        relation: Option<TemporalRelation>,
    ) -> Result<Vec<Edge>> {
        self.temporal().temporal_relations(entity, relation)
    }

    // Time windows

    pub fn entities_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        node_type: Option<&str>,
    ) -> Result<Vec<Node>> {
        self.window().entities_in_range(start, end, node_type)
    }

    pub fn entities_at(&self, instant: DateTime<Utc>, node_type: Option<&str>) -> Result<Vec<Node>> {
        self.window().entities_at(instant, node_type)
    }

    pub fn timeline(&self, node_type: Option<&str>) -> Result<Vec<Node>> {
        self.window().timeline(node_type)
    }

    pub fn time_bound_relationships(
        &self,
        entity: &NodeId,
        at: Option<DateTime<Utc>>,
    ) -> Result<TimeBoundRelationships> {
        self.window().time_bound_relationships(entity, at)
    }
}

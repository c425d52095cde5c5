//! Time-window queries over temporal entities and time-bound edges.

use crate::error::{Error, Result};
use crate::graph::{Edge, GraphStore, Node, NodeFilter, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Time-bound edges around one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeBoundRelationships {
    pub outgoing: Vec<Edge>,
    pub incoming: Vec<Edge>,
}

impl TimeBoundRelationships {
    pub fn len(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }
}

/// Read-only queries by time.
pub struct TimeWindowQuery<'a, S: GraphStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GraphStore + ?Sized> TimeWindowQuery<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Temporal entities whose interval overlaps `[start, end]`.
    ///
    /// Ongoing entities match when they start on or before `end`. Entities
    /// without a start time never match.
    pub fn entities_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        node_type: Option<&str>,
    ) -> Result<Vec<Node>> {
        if end < start {
            return Err(Error::invalid_interval(start, end));
        }

        let entities = self.temporal_entities(node_type)?;
        let matched: Vec<Node> = entities
            .into_iter()
            .filter(|node| overlaps(node, start, end))
            .collect();

        debug!(matched = matched.len(), "Range query");
        Ok(matched)
    }

    /// Temporal entities in effect at `instant`.
    pub fn entities_at(&self, instant: DateTime<Utc>, node_type: Option<&str>) -> Result<Vec<Node>> {
        self.entities_in_range(instant, instant, node_type)
    }

    /// Anchored temporal entities ordered by start time. Equal starts keep
    /// store order.
    pub fn timeline(&self, node_type: Option<&str>) -> Result<Vec<Node>> {
        let mut entities: Vec<(DateTime<Utc>, Node)> = self
            .temporal_entities(node_type)?
            .into_iter()
            .filter_map(|node| node.span().and_then(|s| s.start).map(|start| (start, node)))
            .collect();
        entities.sort_by_key(|(start, _)| *start);
        Ok(entities.into_iter().map(|(_, node)| node).collect())
    }

    /// Time-bound edges around `entity`; with `at`, only those valid then.
    pub fn time_bound_relationships(
        &self,
        entity: &NodeId,
        at: Option<DateTime<Utc>>,
    ) -> Result<TimeBoundRelationships> {
        self.store.require_node(entity)?;

        let keep = |edge: &Edge| edge.is_time_bound() && at.map_or(true, |t| edge.valid_at(t));
        let outgoing = self
            .store
            .get_outgoing_edges(entity, None)?
            .into_iter()
            .filter(|e| keep(e))
            .collect();
        let incoming = self
            .store
            .get_incoming_edges(entity, None)?
            .into_iter()
            .filter(|e| keep(e))
            .collect();

        Ok(TimeBoundRelationships { outgoing, incoming })
    }

    fn temporal_entities(&self, node_type: Option<&str>) -> Result<Vec<Node>> {
        let mut filter = NodeFilter::new().temporal();
        if let Some(node_type) = node_type {
            filter = filter.node_type(node_type);
        }
        self.store.get_nodes_by_properties(&filter, None)
    }
}

fn overlaps(node: &Node, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    let Some(span) = node.span() else {
        return false;
    };
    let Some(entity_start) = span.start else {
        return false;
    };
    match span.end {
        None => entity_start <= end,
        Some(entity_end) => entity_start <= end && start <= entity_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Attributes, Axis, InMemoryGraphStore, TemporalSpan};
    use crate::temporal::TemporalEngine;
    use chrono::TimeZone;

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    struct Fixture {
        store: InMemoryGraphStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: InMemoryGraphStore::new(),
            }
        }

        fn entity(&self, node_type: &str, span: TemporalSpan) -> NodeId {
            TemporalEngine::new(&self.store)
                .create_temporal_entity(node_type, span, Attributes::new())
                .unwrap()
                .id
        }

        fn query(&self) -> TimeWindowQuery<'_, InMemoryGraphStore> {
            TimeWindowQuery::new(&self.store)
        }
    }

    #[test]
    fn test_entities_in_range() {
        let fx = Fixture::new();
        let early = fx.entity("event", TemporalSpan::bounded(jan(1), jan(3)));
        let middle = fx.entity("event", TemporalSpan::bounded(jan(4), jan(6)));
        let ongoing = fx.entity("policy", TemporalSpan::starting(jan(2)));
        fx.entity("policy", TemporalSpan::starting(jan(20)));
        fx.entity("event", TemporalSpan::unanchored());

        let ids: Vec<_> = fx
            .query()
            .entities_in_range(jan(3), jan(5), None)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![early, middle.clone(), ongoing]);

        let events = fx
            .query()
            .entities_in_range(jan(4), jan(4), Some("event"))
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, middle);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.query().entities_in_range(jan(5), jan(1), None),
            Err(Error::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_entities_at_and_timeline() {
        let fx = Fixture::new();
        let late = fx.entity("event", TemporalSpan::bounded(jan(10), jan(12)));
        let early = fx.entity("event", TemporalSpan::starting(jan(1)));
        fx.entity("event", TemporalSpan::unanchored());

        let at = fx.query().entities_at(jan(11), None).unwrap();
        assert_eq!(at.len(), 2);

        let order: Vec<_> = fx
            .query()
            .timeline(None)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(order, vec![early, late]);
    }

    #[test]
    fn test_time_bound_relationships() {
        let fx = Fixture::new();
        let firm = Node::new(Axis::Sector, "company");
        let rule = Node::new(Axis::RegulatoryOctopus, "regulation");
        let board = Node::new(Axis::Sector, "company");
        for node in [&firm, &rule, &board] {
            fx.store.insert_node(node).unwrap();
        }

        let engine = TemporalEngine::new(&fx.store);
        engine
            .create_time_bound_relationship(&firm.id, &rule.id, "subject_to", jan(1), Some(jan(5)), Attributes::new())
            .unwrap();
        engine
            .create_time_bound_relationship(&board.id, &firm.id, "oversees", jan(3), None, Attributes::new())
            .unwrap();
        fx.store
            .insert_edge_if_absent(Edge::new(
                firm.id.clone(),
                board.id.clone(),
                crate::graph::EdgeKind::Relationship {
                    edge_type: "reports_to".into(),
                },
            ))
            .unwrap();

        let all = fx.query().time_bound_relationships(&firm.id, None).unwrap();
        assert_eq!(all.outgoing.len(), 1);
        assert_eq!(all.incoming.len(), 1);

        let early = fx
            .query()
            .time_bound_relationships(&firm.id, Some(jan(2)))
            .unwrap();
        assert_eq!(early.outgoing.len(), 1);
        assert!(early.incoming.is_empty());

        let late = fx
            .query()
            .time_bound_relationships(&firm.id, Some(jan(8)))
            .unwrap();
        assert!(late.outgoing.is_empty());
        assert_eq!(late.len(), 1);
    }
}

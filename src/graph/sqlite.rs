//! SQLite-backed graph store implementation.

use crate::error::{Error, Result};
use crate::graph::schema::{initialize_schema, is_initialized};
use crate::graph::store::{GraphStore, NodeFilter};
use crate::graph::types::*;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

const NODE_COLUMNS: &str = "id, axis, node_type, kind, attributes, created_at";
const EDGE_COLUMNS: &str = "id, source_id, target_id, kind, validity, attributes";

/// SQLite-backed graph store.
#[derive(Clone)]
pub struct SqliteGraphStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGraphStore {
    /// Open or create a graph store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(Error::store)?;

        if !is_initialized(&conn) {
            initialize_schema(&conn).map_err(Error::store)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::store)?;
        initialize_schema(&conn).map_err(Error::store)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Internal(format!("Failed to lock connection: {}", e)))?;
        f(&conn).map_err(Error::store)
    }

    fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<Node> {
        let id_str: String = row.get(0)?;
        let axis_num: i64 = row.get(1)?;

        let axis = u8::try_from(axis_num)
            .ok()
            .and_then(Axis::from_number)
            .ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    Type::Integer,
                    format!("invalid axis number {}", axis_num).into(),
                )
            })?;

        Ok(Node {
            id: NodeId::parse(&id_str).map_err(|e| conversion_error(0, e))?,
            axis,
            node_type: row.get(2)?,
            kind: from_json(row, 3)?,
            attributes: from_json(row, 4)?,
            created_at: parse_datetime(5, row.get::<_, String>(5)?)?,
        })
    }

    fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<Edge> {
        let validity: Option<TimeWindow> = match row.get::<_, Option<String>>(4)? {
            Some(s) => Some(serde_json::from_str(&s).map_err(|e| conversion_error(4, e))?),
            None => None,
        };

        Ok(Edge {
            id: EdgeId::parse(&row.get::<_, String>(0)?).map_err(|e| conversion_error(0, e))?,
            source: NodeId::parse(&row.get::<_, String>(1)?)
                .map_err(|e| conversion_error(1, e))?,
            target: NodeId::parse(&row.get::<_, String>(2)?)
                .map_err(|e| conversion_error(2, e))?,
            kind: from_json(row, 3)?,
            validity,
            attributes: from_json(row, 5)?,
        })
    }

    fn query_edges(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Edge>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let edges = stmt
                .query_map(args, Self::row_to_edge)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(edges)
        })
    }

    /// Get statistics about the graph store.
    pub fn stats(&self) -> Result<GraphStats> {
        self.with_conn(|conn| {
            let total_nodes: i64 =
                conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;

            let nodes_by_axis: HashMap<Axis, i64> = {
                let mut stmt = conn.prepare("SELECT axis, COUNT(*) FROM nodes GROUP BY axis")?;
                let rows = stmt.query_map([], |row| {
                    let axis_num: i64 = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    Ok((axis_num, count))
                })?;
                let mut result = HashMap::new();
                for row in rows {
                    let (axis_num, count) = row?;
                    if let Some(axis) = u8::try_from(axis_num).ok().and_then(Axis::from_number) {
                        result.insert(axis, count);
                    }
                }
                result
            };

            let edges_by_type: HashMap<String, i64> = {
                let mut stmt =
                    conn.prepare("SELECT edge_type, COUNT(*) FROM edges GROUP BY edge_type")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                rows.collect::<rusqlite::Result<HashMap<String, i64>>>()?
            };

            let total_edges: i64 =
                conn.query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;

            Ok(GraphStats {
                total_nodes: total_nodes as u64,
                nodes_by_axis,
                total_edges: total_edges as u64,
                edges_by_type,
            })
        })
    }
}

impl GraphStore for SqliteGraphStore {
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS),
                params![id.to_string()],
                Self::row_to_node,
            )
            .optional()
        })
    }

    fn insert_node(&self, node: &Node) -> Result<()> {
        let kind = serde_json::to_string(&node.kind)?;
        let attributes = serde_json::to_string(&node.attributes)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO nodes (id, axis, node_type, is_temporal, kind, attributes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    node.id.to_string(),
                    node.axis.number() as i64,
                    node.node_type,
                    node.is_temporal(),
                    kind,
                    attributes,
                    node.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn get_nodes_by_properties(
        &self,
        filter: &NodeFilter,
        limit: Option<usize>,
    ) -> Result<Vec<Node>> {
        let nodes = self.with_conn(|conn| {
            let mut sql = format!("SELECT {} FROM nodes WHERE 1=1", NODE_COLUMNS);
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(axis) = filter.axis {
                sql.push_str(" AND axis = ?");
                params_vec.push(Box::new(axis.number() as i64));
            }

            if let Some(ref node_type) = filter.node_type {
                sql.push_str(" AND node_type = ?");
                params_vec.push(Box::new(node_type.clone()));
            }

            if filter.temporal_only {
                sql.push_str(" AND is_temporal = 1");
            }

            sql.push_str(" ORDER BY rowid");

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let nodes = stmt
                .query_map(params_refs.as_slice(), Self::row_to_node)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(nodes)
        })?;

        // Attribute constraints live inside the JSON column
        Ok(nodes
            .into_iter()
            .filter(|n| filter.matches(n))
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn insert_edge_if_absent(&self, edge: Edge) -> Result<(Edge, bool)> {
        let kind = serde_json::to_string(&edge.kind)?;
        let validity = edge
            .validity
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let attributes = serde_json::to_string(&edge.attributes)?;

        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO edges
                    (id, source_id, target_id, edge_type, kind, validity, attributes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    edge.id.to_string(),
                    edge.source.to_string(),
                    edge.target.to_string(),
                    edge.edge_type(),
                    kind,
                    validity,
                    attributes,
                ],
            )?;

            let stored = conn.query_row(
                &format!(
                    "SELECT {} FROM edges
                     WHERE source_id = ?1 AND target_id = ?2 AND edge_type = ?3",
                    EDGE_COLUMNS
                ),
                params![
                    edge.source.to_string(),
                    edge.target.to_string(),
                    edge.edge_type()
                ],
                Self::row_to_edge,
            )?;

            Ok((stored, inserted > 0))
        })
    }

    fn get_outgoing_edges(&self, id: &NodeId, edge_type: Option<&str>) -> Result<Vec<Edge>> {
        let id = id.to_string();
        match edge_type {
            Some(t) => self.query_edges(
                &format!(
                    "SELECT {} FROM edges WHERE source_id = ?1 AND edge_type = ?2 ORDER BY rowid",
                    EDGE_COLUMNS
                ),
                &[&id, &t],
            ),
            None => self.query_edges(
                &format!(
                    "SELECT {} FROM edges WHERE source_id = ?1 ORDER BY rowid",
                    EDGE_COLUMNS
                ),
                &[&id],
            ),
        }
    }

    fn get_incoming_edges(&self, id: &NodeId, edge_type: Option<&str>) -> Result<Vec<Edge>> {
        let id = id.to_string();
        match edge_type {
            Some(t) => self.query_edges(
                &format!(
                    "SELECT {} FROM edges WHERE target_id = ?1 AND edge_type = ?2 ORDER BY rowid",
                    EDGE_COLUMNS
                ),
                &[&id, &t],
            ),
            None => self.query_edges(
                &format!(
                    "SELECT {} FROM edges WHERE target_id = ?1 ORDER BY rowid",
                    EDGE_COLUMNS
                ),
                &[&id],
            ),
        }
    }

    fn get_edges_between(
        &self,
        source: &NodeId,
        target: &NodeId,
        edge_type: Option<&str>,
    ) -> Result<Vec<Edge>> {
        let source = source.to_string();
        let target = target.to_string();
        match edge_type {
            Some(t) => self.query_edges(
                &format!(
                    "SELECT {} FROM edges
                     WHERE source_id = ?1 AND target_id = ?2 AND edge_type = ?3 ORDER BY rowid",
                    EDGE_COLUMNS
                ),
                &[&source, &target, &t],
            ),
            None => self.query_edges(
                &format!(
                    "SELECT {} FROM edges WHERE source_id = ?1 AND target_id = ?2 ORDER BY rowid",
                    EDGE_COLUMNS
                ),
                &[&source, &target],
            ),
        }
    }
}

/// Statistics about the graph store.
#[derive(Debug, Clone)]
pub struct GraphStats {
    pub total_nodes: u64,
    pub nodes_by_axis: HashMap<Axis, i64>,
    pub total_edges: u64,
    pub edges_by_type: HashMap<String, i64>,
}

fn from_json<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_datetime(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConnectionType, TemporalRelation};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_and_get_node() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let node = Node::new(Axis::RegulatoryOctopus, "regulation")
            .with_name("GDPR")
            .with_attribute("jurisdiction", "EU");

        store.insert_node(&node).unwrap();
        let retrieved = store.get_node(&node.id).unwrap().unwrap();

        assert_eq!(retrieved.name(), Some("GDPR"));
        assert_eq!(retrieved.axis, Axis::RegulatoryOctopus);
        assert_eq!(retrieved.attributes, node.attributes);
    }

    #[test]
    fn test_temporal_node_roundtrip() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let node = Node::temporal(
            "period",
            TemporalSpan::bounded(start, end).with_precision(TemporalPrecision::Exact),
        );

        store.insert_node(&node).unwrap();
        let retrieved = store.get_node(&node.id).unwrap().unwrap();
        assert_eq!(retrieved.kind, node.kind);

        let temporal = store
            .get_nodes_by_properties(&NodeFilter::new().temporal(), None)
            .unwrap();
        assert_eq!(temporal.len(), 1);
    }

    #[test]
    fn test_nodes_by_properties() {
        let store = SqliteGraphStore::in_memory().unwrap();
        store
            .insert_node(&Node::new(Axis::Sector, "sector").with_name("Energy"))
            .unwrap();
        store
            .insert_node(&Node::new(Axis::Sector, "sector").with_name("Health"))
            .unwrap();
        store
            .insert_node(&Node::new(Axis::Location, "country").with_name("France"))
            .unwrap();

        let sectors = store
            .get_nodes_by_properties(&NodeFilter::new().axis(Axis::Sector), None)
            .unwrap();
        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors[0].name(), Some("Energy"));

        let health = store
            .get_nodes_by_properties(&NodeFilter::new().attribute("name", "Health"), None)
            .unwrap();
        assert_eq!(health.len(), 1);

        let limited = store
            .get_nodes_by_properties(&NodeFilter::new(), Some(1))
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_insert_edge_if_absent() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let a = NodeId::new();
        let b = NodeId::new();

        let edge = Edge::new(
            a.clone(),
            b.clone(),
            EdgeKind::crosswalk(ConnectionType::RegulatedBy, 0.6),
        )
        .with_attribute("source", "import");

        let (stored, created) = store.insert_edge_if_absent(edge.clone()).unwrap();
        assert!(created);
        assert_eq!(stored, edge);

        let again = Edge::new(
            a.clone(),
            b.clone(),
            EdgeKind::crosswalk(ConnectionType::RegulatedBy, 0.1),
        );
        let (stored, created) = store.insert_edge_if_absent(again).unwrap();
        assert!(!created);
        assert_eq!(stored.strength(), Some(0.6));
    }

    #[test]
    fn test_edge_queries_and_validity() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let a = NodeId::new();
        let b = NodeId::new();
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let bound = Edge::new(
            a.clone(),
            b.clone(),
            EdgeKind::Relationship {
                edge_type: "member_of".to_string(),
            },
        )
        .with_validity(TimeWindow::new(start, None));
        store.insert_edge_if_absent(bound.clone()).unwrap();
        store
            .insert_edge_if_absent(Edge::new(
                b.clone(),
                a.clone(),
                EdgeKind::Temporal {
                    relation: TemporalRelation::After,
                    inferred: false,
                },
            ))
            .unwrap();

        let outgoing = store.get_outgoing_edges(&a, None).unwrap();
        assert_eq!(outgoing, vec![bound]);
        assert_eq!(store.get_incoming_edges(&a, Some("after")).unwrap().len(), 1);
        assert!(store.get_incoming_edges(&a, Some("before")).unwrap().is_empty());
        assert_eq!(store.get_edges_between(&a, &b, None).unwrap().len(), 1);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        let node = Node::new(Axis::PillarLevel, "pillar").with_name("Mathematics");

        {
            let store = SqliteGraphStore::open(&path).unwrap();
            store.insert_node(&node).unwrap();
        }

        let reopened = SqliteGraphStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_node(&node.id).unwrap().unwrap().name(),
            Some("Mathematics")
        );
    }

    #[test]
    fn test_stats() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let a = Node::new(Axis::Sector, "sector");
        let b = Node::new(Axis::Sector, "sector");
        store.insert_node(&a).unwrap();
        store.insert_node(&b).unwrap();
        store
            .insert_edge_if_absent(Edge::new(
                a.id.clone(),
                b.id.clone(),
                EdgeKind::crosswalk(ConnectionType::CompatibleWith, 0.5),
            ))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_nodes, 2);
        assert_eq!(stats.nodes_by_axis.get(&Axis::Sector), Some(&2));
        assert_eq!(stats.total_edges, 1);
        assert_eq!(stats.edges_by_type.get("compatible_with"), Some(&1));
    }

    #[test]
    fn test_corrupt_created_at_is_an_error() {
        let store = SqliteGraphStore::in_memory().unwrap();
        let node = Node::new(Axis::Sector, "sector");
        store.insert_node(&node).unwrap();

        store
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE nodes SET created_at = 'not a timestamp' WHERE id = ?1",
                    params![node.id.to_string()],
                )
            })
            .unwrap();

        let err = store.get_node(&node.id).unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}

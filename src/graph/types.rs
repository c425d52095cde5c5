//! Type definitions for knowledge graph nodes and edges.
//!
//! Nodes and edges keep an open attribute map for extensibility, while the
//! fields the engine reasons about (`strength`, interval endpoints, validity
//! windows) are typed so they cannot drift out of range.

use crate::catalog::{ConnectionType, TemporalRelation};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Open-ended attribute map carried by nodes and edges.
pub type Attributes = BTreeMap<String, Value>;

/// Unique identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Generate a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an edge.
///
/// Edge ids are content-derived: the same `(source, target, edge_type)`
/// triple always maps to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    /// Derive the id for an edge triple.
    pub fn derive(source: &NodeId, target: &NodeId, edge_type: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.0.as_bytes());
        hasher.update(b"->");
        hasher.update(target.0.as_bytes());
        hasher.update(b":");
        hasher.update(edge_type.as_bytes());
        let hash = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the thirteen classification dimensions of the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Knowledge pillars (disciplines).
    PillarLevel,
    /// Industry sectors.
    Sector,
    /// Honeycomb crosswalk hub.
    Honeycomb,
    /// Sector branches.
    Branch,
    /// Individual knowledge nodes.
    Node,
    /// Regulatory frameworks.
    RegulatoryOctopus,
    /// Compliance standards.
    ComplianceSpiderweb,
    /// Knowledge roles.
    KnowledgeRole,
    /// Sector experts.
    SectorExpert,
    /// Regulatory experts.
    RegulatoryExpert,
    /// Compliance experts.
    ComplianceExpert,
    /// Geographic locations.
    Location,
    /// Time periods and events.
    Temporal,
}

impl Axis {
    /// All axes in numeric order.
    pub const ALL: [Axis; 13] = [
        Self::PillarLevel,
        Self::Sector,
        Self::Honeycomb,
        Self::Branch,
        Self::Node,
        Self::RegulatoryOctopus,
        Self::ComplianceSpiderweb,
        Self::KnowledgeRole,
        Self::SectorExpert,
        Self::RegulatoryExpert,
        Self::ComplianceExpert,
        Self::Location,
        Self::Temporal,
    ];

    /// Axis number (1-13).
    pub fn number(&self) -> u8 {
        match self {
            Self::PillarLevel => 1,
            Self::Sector => 2,
            Self::Honeycomb => 3,
            Self::Branch => 4,
            Self::Node => 5,
            Self::RegulatoryOctopus => 6,
            Self::ComplianceSpiderweb => 7,
            Self::KnowledgeRole => 8,
            Self::SectorExpert => 9,
            Self::RegulatoryExpert => 10,
            Self::ComplianceExpert => 11,
            Self::Location => 12,
            Self::Temporal => 13,
        }
    }

    /// Short axis code used by the affinity table.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PillarLevel => "PL",
            Self::Sector => "SEC",
            Self::Honeycomb => "HC",
            Self::Branch => "BR",
            Self::Node => "NODE",
            Self::RegulatoryOctopus => "RO",
            Self::ComplianceSpiderweb => "CS",
            Self::KnowledgeRole => "KR",
            Self::SectorExpert => "SE",
            Self::RegulatoryExpert => "RE",
            Self::ComplianceExpert => "CE",
            Self::Location => "LOC",
            Self::Temporal => "TIME",
        }
    }

    /// Look up an axis by number.
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.number() == number)
    }

    /// Look up an axis by code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.code().eq_ignore_ascii_case(code))
    }

    /// Connection types fan-out rotates through when the caller supplies none.
    pub fn default_strategies(&self) -> Vec<ConnectionType> {
        use ConnectionType::*;
        match self {
            Self::PillarLevel => vec![DirectApplication, PrerequisiteFor, Enables],
            Self::Sector => vec![Implements, DirectApplication, CompatibleWith],
            Self::Honeycomb => vec![CrosswalksTo],
            Self::Branch => vec![DerivedFrom, Specializes],
            Self::Node => vec![Specializes, DerivedFrom, CrosswalksTo],
            Self::RegulatoryOctopus => vec![RegulatedBy, CrosswalksTo],
            Self::ComplianceSpiderweb => vec![CertifiedBy, RegulatedBy],
            Self::KnowledgeRole => vec![Enables, PrerequisiteFor],
            Self::SectorExpert => vec![Enables, Specializes],
            Self::RegulatoryExpert => vec![RegulatedBy, Enables],
            Self::ComplianceExpert => vec![CertifiedBy, Enables],
            Self::Location => vec![RegulatedBy, CompatibleWith],
            Self::Temporal => vec![Extends, CrosswalksTo],
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// How precisely a temporal entity's boundaries are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalPrecision {
    Exact,
    Approximate,
    #[default]
    Unknown,
}

impl std::fmt::Display for TemporalPrecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Approximate => write!(f, "approximate"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Interval carried by a temporal entity. An absent `end` means ongoing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSpan {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Length in seconds, when known.
    pub duration_secs: Option<i64>,
    pub precision: TemporalPrecision,
}

impl TemporalSpan {
    /// Span starting at `start`, ongoing.
    pub fn starting(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
            duration_secs: None,
            precision: TemporalPrecision::Unknown,
        }
    }

    /// Bounded span; duration is derived from the endpoints.
    pub fn bounded(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            duration_secs: Some((end - start).num_seconds()),
            precision: TemporalPrecision::Unknown,
        }
    }

    /// Span with no known anchor.
    pub fn unanchored() -> Self {
        Self {
            start: None,
            end: None,
            duration_secs: None,
            precision: TemporalPrecision::Unknown,
        }
    }

    pub fn with_precision(mut self, precision: TemporalPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Known duration of the span.
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::seconds)
    }

    /// Whether the span has no end.
    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }
}

/// Variant data for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Ordinary concept on one of the axes.
    Concept,
    /// Entity anchored in time.
    Temporal(TemporalSpan),
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,

    /// Axis this node is classified under.
    pub axis: Axis,

    /// Free-form node type tag (e.g. "pillar", "regulation", "event").
    pub node_type: String,

    /// Concept or temporal entity.
    pub kind: NodeKind,

    /// Open-ended attributes (name, description, codes, ...).
    pub attributes: Attributes,

    /// When this node was created.
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Create a concept node.
    pub fn new(axis: Axis, node_type: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            axis,
            node_type: node_type.into(),
            kind: NodeKind::Concept,
            attributes: Attributes::new(),
            created_at: Utc::now(),
        }
    }

    /// Create a temporal entity node on the temporal axis.
    pub fn temporal(node_type: impl Into<String>, span: TemporalSpan) -> Self {
        Self {
            kind: NodeKind::Temporal(span),
            ..Self::new(Axis::Temporal, node_type)
        }
    }

    /// Set the `name` attribute.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_attribute("name", name.into())
    }

    /// Set the `description` attribute.
    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.with_attribute("description", description.into())
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Get a string attribute.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.attribute_str("name")
    }

    /// Temporal span for temporal entities.
    pub fn span(&self) -> Option<&TemporalSpan> {
        match &self.kind {
            NodeKind::Temporal(span) => Some(span),
            NodeKind::Concept => None,
        }
    }

    /// Whether this node is a temporal entity.
    pub fn is_temporal(&self) -> bool {
        matches!(self.kind, NodeKind::Temporal(_))
    }
}

/// Validity window of a time-bound edge. An absent `end` means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Whether `instant` falls inside the window (both ends inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        match self.end {
            Some(end) => self.start <= instant && instant <= end,
            None => self.start <= instant,
        }
    }
}

/// Variant data for an edge. Crosswalk and temporal names live in disjoint
/// namespaces; `Relationship` covers any other caller-defined edge type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    /// Weighted honeycomb connection.
    Crosswalk {
        connection_type: ConnectionType,
        strength: f64,
    },
    /// Interval relation between temporal entities.
    Temporal {
        relation: TemporalRelation,
        inferred: bool,
    },
    /// Any other typed relationship.
    Relationship { edge_type: String },
}

impl EdgeKind {
    /// Crosswalk edge with strength clamped to [0, 1].
    pub fn crosswalk(connection_type: ConnectionType, strength: f64) -> Self {
        Self::Crosswalk {
            connection_type,
            strength: clamp_strength(strength),
        }
    }

    /// Name of the edge type within its namespace.
    pub fn edge_type(&self) -> &str {
        match self {
            Self::Crosswalk {
                connection_type, ..
            } => connection_type.as_str(),
            Self::Temporal { relation, .. } => relation.as_str(),
            Self::Relationship { edge_type } => edge_type,
        }
    }
}

/// A directed edge in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,

    /// Validity window for time-bound edges.
    pub validity: Option<TimeWindow>,

    pub attributes: Attributes,
}

impl Edge {
    /// Create an edge; its id is derived from the endpoints and type.
    pub fn new(source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Self {
            id: EdgeId::derive(&source, &target, kind.edge_type()),
            source,
            target,
            kind,
            validity: None,
            attributes: Attributes::new(),
        }
    }

    /// Make this edge valid only within `window`.
    pub fn with_validity(mut self, window: TimeWindow) -> Self {
        self.validity = Some(window);
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Name of the edge type.
    pub fn edge_type(&self) -> &str {
        self.kind.edge_type()
    }

    /// Crosswalk strength; `None` for non-crosswalk edges.
    pub fn strength(&self) -> Option<f64> {
        match self.kind {
            EdgeKind::Crosswalk { strength, .. } => Some(strength),
            _ => None,
        }
    }

    /// Temporal relation, if this is a temporal edge.
    pub fn relation(&self) -> Option<TemporalRelation> {
        match self.kind {
            EdgeKind::Temporal { relation, .. } => Some(relation),
            _ => None,
        }
    }

    pub fn is_time_bound(&self) -> bool {
        self.validity.is_some()
    }

    /// Whether the edge holds at `instant`. Edges that are not time-bound
    /// are always valid.
    pub fn valid_at(&self, instant: DateTime<Utc>) -> bool {
        self.validity.map_or(true, |w| w.contains(instant))
    }

    /// Flattened attribute view, with the typed fields written back under
    /// their conventional keys.
    pub fn properties(&self) -> Attributes {
        let mut props = self.attributes.clone();
        match &self.kind {
            EdgeKind::Crosswalk {
                connection_type,
                strength,
            } => {
                props.insert("connection_type".into(), connection_type.as_str().into());
                props.insert("strength".into(), (*strength).into());
            }
            EdgeKind::Temporal { relation, inferred } => {
                props.insert("relation_type".into(), relation.as_str().into());
                props.insert("inferred".into(), (*inferred).into());
            }
            EdgeKind::Relationship { .. } => {}
        }
        if let Some(window) = &self.validity {
            props.insert("time_bound".into(), true.into());
            props.insert("start_time".into(), window.start.to_rfc3339().into());
            if let Some(end) = window.end {
                props.insert("end_time".into(), end.to_rfc3339().into());
            }
        }
        props
    }
}

/// Clamp a strength into [0, 1]; NaN becomes 0.
pub fn clamp_strength(strength: f64) -> f64 {
    if strength.is_nan() {
        0.0
    } else {
        strength.clamp(0.0, 1.0)
    }
}

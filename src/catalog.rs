//! Relation catalog: the fixed vocabularies for honeycomb connections and
//! temporal interval relations.
//!
//! The two namespaces are disjoint. A name is either a crosswalk type, a
//! temporal relation, or unknown; unknown crosswalk names may still be used as
//! [`ConnectionType::Custom`] when the caller explicitly opts in.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Typed connection between nodes on different axes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ConnectionType {
    DirectApplication,
    Enables,
    Implements,
    Specializes,
    Extends,
    AlternativeTo,
    DerivedFrom,
    RegulatedBy,
    CertifiedBy,
    CompatibleWith,
    PrerequisiteFor,
    CrosswalksTo,
    /// Caller-supplied name outside the catalog.
    Custom(String),
}

static KNOWN_CONNECTION_TYPES: [ConnectionType; 12] = [
    ConnectionType::DirectApplication,
    ConnectionType::Enables,
    ConnectionType::Implements,
    ConnectionType::Specializes,
    ConnectionType::Extends,
    ConnectionType::AlternativeTo,
    ConnectionType::DerivedFrom,
    ConnectionType::RegulatedBy,
    ConnectionType::CertifiedBy,
    ConnectionType::CompatibleWith,
    ConnectionType::PrerequisiteFor,
    ConnectionType::CrosswalksTo,
];

impl ConnectionType {
    /// All catalog connection types, in catalog order.
    pub fn known() -> &'static [ConnectionType] {
        &KNOWN_CONNECTION_TYPES
    }

    /// Wire name of this connection type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::DirectApplication => "direct_application",
            Self::Enables => "enables",
            Self::Implements => "implements",
            Self::Specializes => "specializes",
            Self::Extends => "extends",
            Self::AlternativeTo => "alternative_to",
            Self::DerivedFrom => "derived_from",
            Self::RegulatedBy => "regulated_by",
            Self::CertifiedBy => "certified_by",
            Self::CompatibleWith => "compatible_with",
            Self::PrerequisiteFor => "prerequisite_for",
            Self::CrosswalksTo => "crosswalks_to",
            Self::Custom(name) => name,
        }
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::DirectApplication => "Source concept applies directly to the target",
            Self::Enables => "Source enables or makes the target possible",
            Self::Implements => "Source implements the target",
            Self::Specializes => "Source is a specialization of the target",
            Self::Extends => "Source extends the target",
            Self::AlternativeTo => "Source is an alternative to the target",
            Self::DerivedFrom => "Source is derived from the target",
            Self::RegulatedBy => "Source is regulated by the target",
            Self::CertifiedBy => "Source is certified by the target",
            Self::CompatibleWith => "Source is compatible with the target",
            Self::PrerequisiteFor => "Source is a prerequisite for the target",
            Self::CrosswalksTo => "Source maps across to the target on another axis",
            Self::Custom(_) => "Custom connection type outside the catalog",
        }
    }

    /// Whether this is a caller-supplied type outside the catalog.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = Error;

    /// Parse a catalog name; unknown names are rejected.
    fn from_str(s: &str) -> Result<Self> {
        Self::known()
            .iter()
            .find(|t| t.as_str() == s)
            .cloned()
            .ok_or_else(|| Error::invalid_relation_type(s))
    }
}

/// Stored names outside the catalog load as custom types; temporal names
/// and blank names are rejected.
impl TryFrom<String> for ConnectionType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        RelationCatalog::parse_crosswalk(&s, true)
    }
}

impl From<ConnectionType> for String {
    fn from(t: ConnectionType) -> Self {
        t.as_str().to_string()
    }
}

/// Allen interval relation between two temporal entities, read as
/// "A `relation` B".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalRelation {
    Before,
    After,
    During,
    Contains,
    Overlaps,
    OverlappedBy,
    Meets,
    MetBy,
    Starts,
    StartedBy,
    Finishes,
    FinishedBy,
    Equals,
}

impl TemporalRelation {
    /// All thirteen relations.
    pub const ALL: [TemporalRelation; 13] = [
        Self::Before,
        Self::After,
        Self::During,
        Self::Contains,
        Self::Overlaps,
        Self::OverlappedBy,
        Self::Meets,
        Self::MetBy,
        Self::Starts,
        Self::StartedBy,
        Self::Finishes,
        Self::FinishedBy,
        Self::Equals,
    ];

    /// Wire name of this relation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::During => "during",
            Self::Contains => "contains",
            Self::Overlaps => "overlaps",
            Self::OverlappedBy => "overlapped_by",
            Self::Meets => "meets",
            Self::MetBy => "met_by",
            Self::Starts => "starts",
            Self::StartedBy => "started_by",
            Self::Finishes => "finishes",
            Self::FinishedBy => "finished_by",
            Self::Equals => "equals",
        }
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Before => "A ends before B starts",
            Self::After => "A starts after B ends",
            Self::During => "A lies within B",
            Self::Contains => "A contains B",
            Self::Overlaps => "A starts first and ends inside B",
            Self::OverlappedBy => "B starts first and ends inside A",
            Self::Meets => "A ends exactly when B starts",
            Self::MetBy => "A starts exactly when B ends",
            Self::Starts => "A and B start together and A ends first",
            Self::StartedBy => "A and B start together and B ends first",
            Self::Finishes => "A and B end together and A starts later",
            Self::FinishedBy => "A and B end together and B starts later",
            Self::Equals => "A and B share both endpoints",
        }
    }

    /// The algebraic inverse: if `A r B` then `B r.inverse() A`.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            Self::During => Self::Contains,
            Self::Contains => Self::During,
            Self::Overlaps => Self::OverlappedBy,
            Self::OverlappedBy => Self::Overlaps,
            Self::Meets => Self::MetBy,
            Self::MetBy => Self::Meets,
            Self::Starts => Self::StartedBy,
            Self::StartedBy => Self::Starts,
            Self::Finishes => Self::FinishedBy,
            Self::FinishedBy => Self::Finishes,
            Self::Equals => Self::Equals,
        }
    }

    /// Relations whose inverse edge is installed alongside the forward edge.
    pub fn installs_inverse(&self) -> bool {
        matches!(
            self,
            Self::Before | Self::After | Self::During | Self::Contains
        )
    }
}

impl std::fmt::Display for TemporalRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemporalRelation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| Error::invalid_relation_type(s))
    }
}

/// Registry of allowed relation names.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationCatalog;

impl RelationCatalog {
    /// Whether `name` is a catalog crosswalk type.
    pub fn is_valid_crosswalk_type(name: &str) -> bool {
        name.parse::<ConnectionType>().is_ok()
    }

    /// Whether `name` is a temporal relation.
    pub fn is_valid_temporal_type(name: &str) -> bool {
        name.parse::<TemporalRelation>().is_ok()
    }

    /// Describe any catalog name.
    pub fn describe(name: &str) -> Result<&'static str> {
        if let Ok(t) = name.parse::<ConnectionType>() {
            return Ok(t.description());
        }
        name.parse::<TemporalRelation>().map(|r| r.description())
    }

    /// Catalog crosswalk types.
    pub fn crosswalk_types() -> &'static [ConnectionType] {
        ConnectionType::known()
    }

    /// Catalog temporal relations.
    pub fn temporal_types() -> &'static [TemporalRelation] {
        &TemporalRelation::ALL
    }

    /// Resolve a crosswalk name.
    ///
    /// Unknown names become [`ConnectionType::Custom`] only when
    /// `allow_custom` is set. A name from the temporal namespace is always
    /// rejected so the two edge namespaces never mix.
    pub fn parse_crosswalk(name: &str, allow_custom: bool) -> Result<ConnectionType> {
        match name.parse::<ConnectionType>() {
            Ok(t) => Ok(t),
            Err(err) => {
                if !allow_custom || name.trim().is_empty() || Self::is_valid_temporal_type(name) {
                    return Err(err);
                }
                Ok(ConnectionType::Custom(name.to_string()))
            }
        }
    }

    /// Resolve a temporal relation name.
    pub fn parse_temporal(name: &str) -> Result<TemporalRelation> {
        name.parse()
    }
}

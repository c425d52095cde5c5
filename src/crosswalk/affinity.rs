//! Affinity scoring between two nodes.
//!
//! A static priority table keyed by axis codes decides the connection for
//! well-known axis pairs. Other pairs fall back to comparing the nodes' names
//! and descriptions.

use crate::catalog::ConnectionType;
use crate::config::EngineConfig;
use crate::graph::Node;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("valid word pattern"));

/// Which rule produced an affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffinityBasis {
    /// Axis pair found in the priority table.
    PriorityTable,
    /// Names or descriptions share a keyword.
    KeywordOverlap,
    /// One of the nodes is named as a generic concept.
    GenericMarker,
    /// Nothing matched.
    Default,
}

/// Suggested connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affinity {
    pub connection_type: ConnectionType,
    pub strength: f64,
    pub basis: AffinityBasis,
}

impl Affinity {
    fn new(connection_type: ConnectionType, strength: f64, basis: AffinityBasis) -> Self {
        Self {
            connection_type,
            strength,
            basis,
        }
    }
}

/// Priority connection for an ordered axis-code pair.
pub fn priority_connection(a: &str, b: &str) -> Option<(ConnectionType, f64)> {
    use ConnectionType::*;
    let entry = match (a, b) {
        ("PL", "SEC") => (DirectApplication, 0.9),
        ("SEC", "PL") => (Implements, 0.85),
        ("PL", "KR") => (PrerequisiteFor, 0.75),
        ("SEC", "BR") => (Extends, 0.85),
        ("BR", "SEC") => (DerivedFrom, 0.85),
        ("NODE", "BR") => (DerivedFrom, 0.8),
        ("SEC", "RO") => (RegulatedBy, 0.9),
        ("SEC", "CS") => (CertifiedBy, 0.85),
        ("RO", "CS") => (Enables, 0.8),
        ("CS", "RO") => (Implements, 0.8),
        ("SE", "SEC") => (Specializes, 0.9),
        ("RE", "RO") => (Specializes, 0.9),
        ("CE", "CS") => (Specializes, 0.9),
        ("KR", "SE") => (Enables, 0.7),
        ("LOC", "RO") => (RegulatedBy, 0.8),
        ("HC", "PL") => (CrosswalksTo, 0.75),
        ("TIME", "RO") => (Extends, 0.6),
        _ => return None,
    };
    Some(entry)
}

/// Scores node pairs using the priority table and text heuristics.
#[derive(Debug, Clone)]
pub struct AffinityScorer {
    generic_markers: Vec<String>,
    min_keyword_len: usize,
}

impl AffinityScorer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            generic_markers: config
                .generic_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            min_keyword_len: config.min_keyword_len,
        }
    }

    /// Pick a connection type and strength for `a -> b`.
    pub fn score(&self, a: &Node, b: &Node) -> Affinity {
        if let Some((connection_type, strength)) = priority_connection(a.axis.code(), b.axis.code())
        {
            return Affinity::new(connection_type, strength, AffinityBasis::PriorityTable);
        }

        let words_a = self.keywords(a);
        let words_b = self.keywords(b);
        if !words_a.is_disjoint(&words_b) {
            return Affinity::new(
                ConnectionType::DirectApplication,
                0.8,
                AffinityBasis::KeywordOverlap,
            );
        }

        if self.is_generic(a) || self.is_generic(b) {
            return Affinity::new(ConnectionType::Implements, 0.7, AffinityBasis::GenericMarker);
        }

        Affinity::new(ConnectionType::CrosswalksTo, 0.5, AffinityBasis::Default)
    }

    fn keywords(&self, node: &Node) -> BTreeSet<String> {
        let text = [node.name(), node.attribute_str("description")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        WORD_PATTERN
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|w| w.chars().count() >= self.min_keyword_len)
            .map(str::to_string)
            .collect()
    }

    fn is_generic(&self, node: &Node) -> bool {
        let name = node.name().unwrap_or_default().to_lowercase();
        self.generic_markers.iter().any(|m| name.contains(m))
    }
}

impl Default for AffinityScorer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Axis;

    #[test]
    fn test_priority_table_wins() {
        let scorer = AffinityScorer::default();
        let pillar = Node::new(Axis::PillarLevel, "pillar").with_name("Medicine");
        let sector = Node::new(Axis::Sector, "sector").with_name("Medicine");

        let affinity = scorer.score(&pillar, &sector);
        assert_eq!(affinity.connection_type, ConnectionType::DirectApplication);
        assert_eq!(affinity.strength, 0.9);
        assert_eq!(affinity.basis, AffinityBasis::PriorityTable);

        // The table is directional
        let reverse = scorer.score(&sector, &pillar);
        assert_eq!(reverse.connection_type, ConnectionType::Implements);
    }

    #[test]
    fn test_keyword_overlap() {
        let scorer = AffinityScorer::default();
        let role = Node::new(Axis::KnowledgeRole, "role")
            .with_name("Data Analyst")
            .with_description("Works with clinical datasets");
        let location = Node::new(Axis::Location, "region").with_name("Clinical trial region");

        let affinity = scorer.score(&role, &location);
        assert_eq!(affinity.connection_type, ConnectionType::DirectApplication);
        assert_eq!(affinity.strength, 0.8);
        assert_eq!(affinity.basis, AffinityBasis::KeywordOverlap);
    }

    #[test]
    fn test_short_words_ignored() {
        let scorer = AffinityScorer::default();
        let a = Node::new(Axis::KnowledgeRole, "role").with_name("The art of war");
        let b = Node::new(Axis::Location, "region").with_name("The map of art");

        assert_eq!(scorer.score(&a, &b).basis, AffinityBasis::Default);
    }

    #[test]
    fn test_generic_marker() {
        let scorer = AffinityScorer::default();
        let a = Node::new(Axis::Node, "node").with_name("Universal Principles");
        let b = Node::new(Axis::Location, "region").with_name("Nordics");

        let affinity = scorer.score(&a, &b);
        assert_eq!(affinity.connection_type, ConnectionType::Implements);
        assert_eq!(affinity.strength, 0.7);
    }

    #[test]
    fn test_default_fallback() {
        let scorer = AffinityScorer::default();
        let a = Node::new(Axis::Node, "node").with_name("Bridges");
        let b = Node::new(Axis::Location, "region");

        let affinity = scorer.score(&a, &b);
        assert_eq!(affinity.connection_type, ConnectionType::CrosswalksTo);
        assert_eq!(affinity.strength, 0.5);
        assert_eq!(affinity.basis, AffinityBasis::Default);
    }

    #[test]
    fn test_keywords_keep_non_ascii_words_whole() {
        let scorer = AffinityScorer::default();
        let role = Node::new(Axis::KnowledgeRole, "role").with_name("Marktüberwachung Analyst");
        let region = Node::new(Axis::Location, "region").with_name("Markt Überwachung");

        // "marktüberwachung" is one word, so neither "markt" nor
        // "überwachung" overlaps with it
        assert_eq!(scorer.score(&role, &region).basis, AffinityBasis::Default);

        let office = Node::new(Axis::Location, "region").with_name("Überwachung Zentrale");
        let auditor = Node::new(Axis::KnowledgeRole, "role").with_name("Überwachung Prüfer");
        assert_eq!(
            scorer.score(&auditor, &office).basis,
            AffinityBasis::KeywordOverlap
        );
    }
}

//! Engine configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the reasoning engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Strength assigned by fan-out when the caller gives none
    pub default_strength: f64,
    /// Depth used by `find_paths` callers that don't pick one
    pub default_max_depth: usize,
    /// Keep at most this many ranked paths (None keeps all)
    pub max_paths: Option<usize>,
    /// Candidates fetched per axis when a fan-out plan omits the axis
    pub default_per_axis_budget: usize,
    /// Accept connection types outside the catalog (flagged as custom)
    pub allow_custom_types: bool,
    /// Name terms that mark a node as generic for affinity scoring
    pub generic_markers: Vec<String>,
    /// Shortest word counted by the keyword overlap heuristic
    pub min_keyword_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_strength: 0.7,
            default_max_depth: 4,
            max_paths: None,
            default_per_axis_budget: 3,
            allow_custom_types: false,
            generic_markers: vec!["universal".to_string(), "foundation".to_string()],
            min_keyword_len: 4,
        }
    }
}

impl EngineConfig {
    /// Strict configuration: catalog types only, shallow bounded search.
    pub fn strict() -> Self {
        Self {
            default_max_depth: 3,
            max_paths: Some(10),
            allow_custom_types: false,
            ..Self::default()
        }
    }

    /// Permissive configuration: unknown connection types are accepted
    /// and flagged as custom.
    pub fn permissive() -> Self {
        Self {
            default_max_depth: 6,
            allow_custom_types: true,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is in range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_strength) {
            return Err(Error::Config(format!(
                "default_strength must be within [0, 1], got {}",
                self.default_strength
            )));
        }
        if self.max_paths == Some(0) {
            return Err(Error::Config("max_paths must be positive".to_string()));
        }
        if self.min_keyword_len == 0 {
            return Err(Error::Config("min_keyword_len must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.default_strength, 0.7);
        assert!(!config.allow_custom_types);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert!(EngineConfig::permissive().allow_custom_types);
        assert_eq!(EngineConfig::strict().max_paths, Some(10));
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{"allow_custom_types": true}"#).unwrap();
        assert!(config.allow_custom_types);
        assert_eq!(config.default_per_axis_budget, 3);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let err = EngineConfig::from_json(r#"{"default_strength": 1.5}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = EngineConfig {
            max_paths: Some(0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

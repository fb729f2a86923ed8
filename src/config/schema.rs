//! Configuration data structures for flow analysis.
//!
//! Defines the YAML format for the source registry and sink classifier.
//! Every section is optional; omitted sections keep the built-in registry.

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};
use crate::flow::registry::{SinkClassifier, SourceRegistry};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Immutable registries handed to the analysis entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Config format version (currently "1.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// Which API call nodes start flows, and how their values are normalized.
    #[serde(default)]
    pub sources: SourceRegistry,

    /// Which edges (and nodes) count as storage writes.
    #[serde(default)]
    pub sinks: SinkClassifier,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            sources: SourceRegistry::default(),
            sinks: SinkClassifier::default(),
        }
    }
}

impl FlowConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject registries that could never produce a candidate.
    pub fn validate(&self) -> Result<()> {
        if self.sources.api_node_type.trim().is_empty() {
            return Err(FlowError::Config("sources.api_node_type is empty".into()));
        }
        if self.sources.methods.is_empty() {
            return Err(FlowError::Config("sources.methods is empty".into()));
        }
        if self.sinks.edge_types.is_empty() {
            return Err(FlowError::Config("sinks.edge_types is empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_version() -> String {
    "1.0".to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Registry configuration: built-in defaults plus an optional YAML override.

pub mod schema;

use std::path::Path;

pub use schema::FlowConfig;

use crate::error::{FlowError, Result};

/// Load the registries from `path`, or the built-in ones when `None`.
pub fn load_config(path: Option<&Path>) -> Result<FlowConfig> {
    let Some(path) = path else {
        return Ok(FlowConfig::default());
    };
    let yaml = std::fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
    let config = FlowConfig::from_yaml_str(&yaml)?;
    tracing::debug!(
        "Loaded config from {} ({} source methods, {} sink edge types)",
        path.display(),
        config.sources.methods.len(),
        config.sinks.edge_types.len()
    );
    Ok(config)
}

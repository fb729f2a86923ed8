//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading event graphs, configs, or candidate artifacts.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed graph: {0}")]
    GraphFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("node not found in graph: {0}")]
    UnknownNode(String),

    #[error("edge not found in graph: {0}")]
    UnknownEdge(String),
}

impl FlowError {
    /// Wrap an I/O error together with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for FlowError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(quick_xml::Error::from(err))
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

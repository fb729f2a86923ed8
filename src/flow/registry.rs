//! Source and sink registries.
//!
//! Sources are web API call nodes whose method is registered together with
//! a normalizer that extracts the comparable part of the value read. Sinks
//! are storage-write edges (and, for reachability reports, storage nodes).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{EventEdge, EventNode};

/// `node type` marking a web API call.
pub const WEB_API_NODE_TYPE: &str = "web API";

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// How the value recorded at a source is reduced before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    /// Keep the whole string.
    WholeString,
    /// Keep what follows the first `?` or `#`; empty when neither occurs.
    ParamsOnly,
}

fn param_part() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)[?#](.*)$").ok()).as_ref()
}

impl Normalizer {
    pub fn apply(self, raw: &str) -> String {
        match self {
            Self::WholeString => raw.to_string(),
            Self::ParamsOnly => param_part()
                .and_then(|re| re.captures(raw))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WholeString => "whole_string",
            Self::ParamsOnly => "params_only",
        }
    }
}

impl std::fmt::Display for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SourceRegistry
// ---------------------------------------------------------------------------

/// Registered source methods and the node type that marks API calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRegistry {
    #[serde(default = "default_api_node_type")]
    pub api_node_type: String,

    #[serde(default = "default_methods")]
    pub methods: BTreeMap<String, Normalizer>,
}

fn default_api_node_type() -> String {
    WEB_API_NODE_TYPE.to_string()
}

fn default_methods() -> BTreeMap<String, Normalizer> {
    [
        ("Document.referrer", Normalizer::ParamsOnly),
        ("Location.href", Normalizer::ParamsOnly),
        ("Location.hash", Normalizer::WholeString),
        ("Location.search", Normalizer::WholeString),
    ]
    .into_iter()
    .map(|(method, normalizer)| (method.to_string(), normalizer))
    .collect()
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self {
            api_node_type: default_api_node_type(),
            methods: default_methods(),
        }
    }
}

impl SourceRegistry {
    /// The normalizer for `node` if it is a registered source.
    pub fn classify(&self, node: &EventNode) -> Option<Normalizer> {
        if node.node_type.as_deref() != Some(self.api_node_type.as_str()) {
            return None;
        }
        self.methods.get(node.method.as_deref()?).copied()
    }
}

// ---------------------------------------------------------------------------
// SinkClassifier
// ---------------------------------------------------------------------------

/// Storage-write edge types and storage node types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkClassifier {
    #[serde(default = "default_edge_types")]
    pub edge_types: BTreeSet<String>,

    #[serde(default = "default_node_types")]
    pub node_types: BTreeSet<String>,
}

fn default_edge_types() -> BTreeSet<String> {
    BTreeSet::from(["storage set".to_string()])
}

fn default_node_types() -> BTreeSet<String> {
    ["local storage", "cookie jar", "resource"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for SinkClassifier {
    fn default() -> Self {
        Self {
            edge_types: default_edge_types(),
            node_types: default_node_types(),
        }
    }
}

impl SinkClassifier {
    pub fn is_sink_edge(&self, edge: &EventEdge) -> bool {
        edge.edge_type
            .as_deref()
            .is_some_and(|t| self.edge_types.contains(t))
    }

    pub fn is_sink_node(&self, node: &EventNode) -> bool {
        node.node_type
            .as_deref()
            .is_some_and(|t| self.node_types.contains(t))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

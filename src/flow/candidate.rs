//! Candidate flow records and the sidecar artifact that stores them.
//!
//! The artifact is `<graph-file>-candidates.json`: a JSON array of
//! `[path, {"lcs": "..."}]` entries, each path being a list of edge
//! descriptors resolvable against the source graph file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FlowError, Result};
use crate::types::EdgeDescriptor;

/// Suffix appended to the graph file name to form the artifact name.
pub const CANDIDATES_SUFFIX: &str = "-candidates.json";

/// Evidence attached to a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidateAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcs: Option<String>,
}

/// A source-to-sink path corroborated by a shared substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: Vec<EdgeDescriptor>,
    pub attrs: CandidateAttrs,
}

impl Candidate {
    pub fn new(path: Vec<EdgeDescriptor>, lcs: String) -> Self {
        Self {
            path,
            attrs: CandidateAttrs { lcs: Some(lcs) },
        }
    }

    pub fn lcs(&self) -> Option<&str> {
        self.attrs.lcs.as_deref()
    }
}

impl Serialize for Candidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (&self.path, &self.attrs).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Candidate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (path, attrs) = <(Vec<EdgeDescriptor>, CandidateAttrs)>::deserialize(deserializer)?;
        Ok(Self { path, attrs })
    }
}

// ---------------------------------------------------------------------------
// Artifact I/O
// ---------------------------------------------------------------------------

/// `<graph-file>-candidates.json`, next to the graph file.
pub fn candidates_path_for(graph_path: &Path) -> PathBuf {
    let mut name = graph_path.as_os_str().to_owned();
    name.push(CANDIDATES_SUFFIX);
    PathBuf::from(name)
}

/// Write the whole batch of candidates at once.
pub fn write_candidates(path: &Path, candidates: &[Candidate]) -> Result<()> {
    let json = serde_json::to_string(candidates)?;
    std::fs::write(path, json).map_err(|e| FlowError::io(path, e))?;
    tracing::info!("Wrote {} candidates to {}", candidates.len(), path.display());
    Ok(())
}

pub fn read_candidates(path: &Path) -> Result<Vec<Candidate>> {
    let text = std::fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

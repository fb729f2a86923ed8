//! Flow layer: source/sink registries, LCS evidence, candidate search and
//! the candidate artifact.

pub mod analysis;
pub mod candidate;
pub mod lcs;
pub mod registry;

use std::path::{Path, PathBuf};

pub use analysis::{AnalysisStats, FlowAnalyzer, Reachability, ReachedNode, Rejection};
pub use candidate::{candidates_path_for, read_candidates, write_candidates, Candidate};
pub use registry::{Normalizer, SinkClassifier, SourceRegistry};

use crate::cli::{EXIT_NO_FLOWS, EXIT_OK};
use crate::config::FlowConfig;
use crate::error::Result;
use crate::graph::graphml::read_graphml;

/// Result of analyzing one graph file.
#[derive(Debug)]
pub enum Outcome {
    /// At least one candidate; the artifact has been written.
    Found {
        candidates: Vec<Candidate>,
        artifact: PathBuf,
    },
    /// Nothing found; no artifact written.
    NoneFound,
}

impl Outcome {
    /// Process exit code: 0 when flows were found, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Found { .. } => EXIT_OK,
            Self::NoneFound => EXIT_NO_FLOWS,
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Found { candidates, .. } => candidates,
            Self::NoneFound => &[],
        }
    }
}

/// Load `graph_path`, search it, and persist the batch if non-empty.
pub fn analyze_file(graph_path: &Path, config: &FlowConfig) -> Result<Outcome> {
    let graph = read_graphml(graph_path)?;
    let candidates = FlowAnalyzer::new(&graph, config).find_candidates();
    if candidates.is_empty() {
        tracing::info!("No candidate flows in {}", graph_path.display());
        return Ok(Outcome::NoneFound);
    }
    let artifact = candidates_path_for(graph_path);
    write_candidates(&artifact, &candidates)?;
    Ok(Outcome::Found {
        candidates,
        artifact,
    })
}

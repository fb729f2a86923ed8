//! Source-to-sink flow analysis.
//!
//! For every registered source node, enumerate its maximal flow paths, keep
//! those whose last edge is a storage write, and promote a path to a
//! [`Candidate`] when the normalized source value and the sink value share a
//! non-empty common substring.

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::config::FlowConfig;
use crate::flow::candidate::Candidate;
use crate::flow::lcs::longest_common_substring;
use crate::flow::registry::Normalizer;
use crate::graph::store::EventGraph;
use crate::graph::traversal::ForwardEdgeIndex;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Counters from one candidate search, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub sources: usize,
    pub paths: usize,
    pub sink_paths: usize,
    pub candidates: usize,
}

/// A node reached from a source in the reachability query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachedNode {
    pub id: String,
    /// Whether its `node type` is a storage sink type.
    pub sink: bool,
}

/// Why a flow path was not promoted to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The path is empty.
    Empty,
    /// The last edge is not a storage write.
    NotASink,
    /// Source and sink values share no substring.
    NoOverlap,
}

/// Everything reachable from one source node by later edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    pub source: String,
    pub method: String,
    pub reached: Vec<ReachedNode>,
}

// ---------------------------------------------------------------------------
// FlowAnalyzer
// ---------------------------------------------------------------------------

/// Candidate search over one immutable graph with one set of registries.
pub struct FlowAnalyzer<'a> {
    index: ForwardEdgeIndex<'a>,
    config: &'a FlowConfig,
}

impl<'a> FlowAnalyzer<'a> {
    pub fn new(graph: &'a EventGraph, config: &'a FlowConfig) -> Self {
        Self {
            index: ForwardEdgeIndex::new(graph),
            config,
        }
    }

    /// Registered source nodes with their normalizers, ordered by node id.
    pub fn sources(&self) -> Vec<(NodeIndex, Normalizer)> {
        let graph = self.index.graph();
        let mut sources: Vec<(NodeIndex, Normalizer)> = graph
            .nodes()
            .filter_map(|(idx, node)| Some((idx, self.config.sources.classify(node)?)))
            .collect();
        sources.sort_by(|a, b| graph.node(a.0).id.cmp(&graph.node(b.0).id));
        sources
    }

    /// Promote `path` to a candidate if it ends at a sink and the values overlap.
    pub fn validate(&self, normalizer: Normalizer, path: &[EdgeIndex]) -> Result<Candidate, Rejection> {
        let graph = self.index.graph();
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            return Err(Rejection::Empty);
        };
        let (first, last) = (graph.edge(first), graph.edge(last));
        if !self.config.sinks.is_sink_edge(last) {
            return Err(Rejection::NotASink);
        }

        let source_value = normalizer.apply(first.value_or_empty());
        let lcs = longest_common_substring(&source_value, last.value_or_empty());
        if lcs.is_empty() {
            tracing::debug!(
                "Sink path of {} edges has no overlap with \"{}\"",
                path.len(),
                source_value
            );
            return Err(Rejection::NoOverlap);
        }

        let descriptors = path.iter().filter_map(|&e| graph.descriptor(e)).collect();
        Ok(Candidate::new(descriptors, lcs))
    }

    /// All candidates across all sources, as one batch.
    pub fn find_candidates(&self) -> Vec<Candidate> {
        self.find_candidates_with_stats().0
    }

    pub fn find_candidates_with_stats(&self) -> (Vec<Candidate>, AnalysisStats) {
        let graph = self.index.graph();
        let mut stats = AnalysisStats::default();
        let mut found = Vec::new();

        for (source, normalizer) in self.sources() {
            stats.sources += 1;
            for path in self.index.flow_paths(source) {
                stats.paths += 1;
                match self.validate(normalizer, &path) {
                    Ok(candidate) => {
                        stats.sink_paths += 1;
                        tracing::debug!(
                            "Candidate from {} ({} edges): {:?}",
                            graph.node(source).id,
                            path.len(),
                            candidate.lcs()
                        );
                        found.push(candidate);
                    }
                    Err(Rejection::NoOverlap) => stats.sink_paths += 1,
                    Err(Rejection::NotASink | Rejection::Empty) => {}
                }
            }
        }

        stats.candidates = found.len();
        tracing::info!(
            "{} sources, {} paths, {} reach a sink, {} candidates",
            stats.sources,
            stats.paths,
            stats.sink_paths,
            stats.candidates
        );
        (found, stats)
    }

    /// Reachability report for every source node. Independent of candidates.
    pub fn reachability(&self) -> Vec<Reachability> {
        let graph = self.index.graph();
        self.sources()
            .into_iter()
            .map(|(source, _)| {
                let node = graph.node(source);
                let reached = self
                    .index
                    .reachable_nodes(source)
                    .into_iter()
                    .filter(|&idx| idx != source)
                    .map(|idx| {
                        let reached = graph.node(idx);
                        ReachedNode {
                            id: reached.id.clone(),
                            sink: self.config.sinks.is_sink_node(reached),
                        }
                    })
                    .collect();
                Reachability {
                    source: node.id.clone(),
                    method: node.method.clone().unwrap_or_default(),
                    reached,
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

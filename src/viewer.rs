//! Plain-text rendering of candidate flows for triage.
//!
//! Trusts the artifact: paths are only resolved against the graph, never
//! re-validated.

use std::io::Write;

use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::flow::Candidate;
use crate::graph::store::EventGraph;

const MINOR_RULE: &str = "------------------------------------------------------------";
const MAJOR_RULE: &str = "============================================================";

/// Print every candidate: source node, each edge with its destination node,
/// then the recorded LCS.
pub fn render_candidates<W: Write>(graph: &EventGraph, candidates: &[Candidate], out: &mut W) -> Result<()> {
    for candidate in candidates {
        render_candidate(graph, candidate, out)?;
    }
    Ok(())
}

fn render_candidate<W: Write>(graph: &EventGraph, candidate: &Candidate, out: &mut W) -> Result<()> {
    if let Some(first) = candidate.path.first() {
        let source = graph
            .node_by_id(&first.origin)
            .ok_or_else(|| FlowError::UnknownNode(first.origin.clone()))?;
        emit(out, &Value::Object(source.attributes()).to_string())?;
    }

    for descriptor in &candidate.path {
        let edge = graph.resolve(descriptor)?;
        let destination = graph
            .node_by_id(&descriptor.destination)
            .ok_or_else(|| FlowError::UnknownNode(descriptor.destination.clone()))?;
        emit(out, &format!("-> {}", Value::Object(graph.edge(edge).attributes())))?;
        emit(out, &Value::Object(destination.attributes()).to_string())?;
    }

    if let Some(lcs) = candidate.lcs() {
        emit(out, MINOR_RULE)?;
        emit(out, &format!("Longest common substring: {lcs}"))?;
    }
    emit(out, MAJOR_RULE)
}

fn emit<W: Write>(out: &mut W, line: &str) -> Result<()> {
    writeln!(out, "{line}").map_err(|e| FlowError::io("<output>", e))
}

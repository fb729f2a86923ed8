//! Command-line front ends for `find-forward-flows` and `show-flows`.
//!
//! Exit codes: 0 flows found (or usage printed by the analyzer), 1 no flows
//! found, 2 viewer usage error, 3 fatal error.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::config::load_config;
use crate::error::{FlowError, Result};
use crate::flow::{analyze_file, candidates_path_for, read_candidates, FlowAnalyzer, Outcome};
use crate::graph::graphml::read_graphml;
use crate::viewer::render_candidates;

pub const EXIT_OK: u8 = 0;
pub const EXIT_NO_FLOWS: u8 = 1;
pub const EXIT_USAGE: u8 = 2;
pub const EXIT_FAILURE: u8 = 3;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Default)]
#[command(name = "find-forward-flows")]
#[command(about = "Find storage writes fed by privacy-sensitive browser APIs in an event graph")]
pub struct FindArgs {
    /// GraphML event graph to analyze.
    pub graph: Option<PathBuf>,

    /// YAML file overriding the source and sink registries.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the nodes reachable from each source instead of searching for flows.
    #[arg(long)]
    pub reachability: bool,

    /// Debug-level logging (ignored when RUST_LOG is set).
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug, Default)]
#[command(name = "show-flows")]
#[command(about = "Print candidate flows against the event graph they came from")]
pub struct ShowArgs {
    /// GraphML event graph the candidates were found in.
    pub graph: Option<PathBuf>,

    /// Candidate artifact (defaults to <graph>-candidates.json).
    pub candidates: Option<PathBuf>,

    /// Debug-level logging (ignored when RUST_LOG is set).
    #[arg(short, long)]
    pub verbose: bool,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Analyze one graph; returns the process exit code.
pub fn find_forward_flows<W: Write>(args: &FindArgs, out: &mut W) -> Result<u8> {
    let Some(graph_path) = args.graph.as_deref() else {
        line(out, "usage: find-forward-flows GRAPHML_FILENAME")?;
        return Ok(EXIT_OK);
    };
    let config = load_config(args.config.as_deref())?;

    if args.reachability {
        let graph = read_graphml(graph_path)?;
        for report in FlowAnalyzer::new(&graph, &config).reachability() {
            line(out, &format!("{} ({})", report.source, report.method))?;
            for node in &report.reached {
                let marker = if node.sink { " [sink]" } else { "" };
                line(out, &format!("  {}{marker}", node.id))?;
            }
        }
        return Ok(EXIT_OK);
    }

    let outcome = analyze_file(graph_path, &config)?;
    for candidate in outcome.candidates() {
        line(out, candidate.lcs().unwrap_or_default())?;
    }
    if let Outcome::Found { artifact, .. } = &outcome {
        tracing::info!("Candidates written to {}", artifact.display());
    }
    Ok(outcome.exit_code())
}

/// Render a candidate artifact; returns the process exit code.
pub fn show_flows<W: Write>(args: &ShowArgs, out: &mut W) -> Result<u8> {
    let Some(graph_path) = args.graph.as_deref() else {
        line(out, "usage: show-flows GRAPHML_FILE [JSON_FILE]")?;
        return Ok(EXIT_USAGE);
    };
    let candidates_path = args
        .candidates
        .clone()
        .unwrap_or_else(|| candidates_path_for(graph_path));

    let graph = read_graphml(graph_path)?;
    let candidates = read_candidates(&candidates_path)?;
    render_candidates(&graph, &candidates, out)?;
    Ok(EXIT_OK)
}

/// Map a command result to a process exit code, reporting fatal errors.
pub fn exit_code(result: Result<u8>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn line<W: Write>(out: &mut W, text: &str) -> Result<()> {
    writeln!(out, "{text}").map_err(|e| FlowError::io("<stdout>", e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

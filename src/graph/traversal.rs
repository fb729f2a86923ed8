//! Temporal traversal over the event graph.
//!
//! [`ForwardEdgeIndex`] answers the two "what happened next at this node"
//! queries everything else builds on:
//!
//! - [`ForwardEdgeIndex::any_after`]: every out-edge later than a baseline id
//! - [`ForwardEdgeIndex::immediate_successor`]: the out-edge whose id is
//!   exactly baseline + 1
//!
//! On top of it sit the flow path enumerator ([`FlowPaths`]), which follows
//! strict +1 chains from a source node, and the broader reachability query
//! ([`ForwardEdgeIndex::reachable_nodes`]), which follows any later edge.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::graph::store::EventGraph;
use crate::types::EdgeKey;

// ---------------------------------------------------------------------------
// ForwardEdgeIndex
// ---------------------------------------------------------------------------

/// Per-node out-edges sorted by `(id, destination, key)`.
///
/// Sorting makes both queries a binary search and pins the choice among
/// duplicate ids to the smallest destination-and-key pair.
pub struct ForwardEdgeIndex<'g> {
    graph: &'g EventGraph,
    out: HashMap<NodeIndex, Vec<EdgeIndex>>,
}

impl<'g> ForwardEdgeIndex<'g> {
    /// Build the index over every node of the graph.
    pub fn new(graph: &'g EventGraph) -> Self {
        let mut out: HashMap<NodeIndex, Vec<EdgeIndex>> = HashMap::new();
        for (idx, _) in graph.nodes() {
            let mut edges: Vec<(i64, &str, &EdgeKey, EdgeIndex)> = graph
                .out_edges(idx)
                .map(|e| {
                    let dest = graph.node(e.target()).id.as_str();
                    (e.weight().seq, dest, &e.weight().key, e.id())
                })
                .collect();
            if edges.is_empty() {
                continue;
            }
            edges.sort();
            out.insert(idx, edges.into_iter().map(|(_, _, _, e)| e).collect());
        }
        Self { graph, out }
    }

    pub fn graph(&self) -> &'g EventGraph {
        self.graph
    }

    /// Every out-edge of `node`, ordered by id.
    pub fn out_edges(&self, node: NodeIndex) -> &[EdgeIndex] {
        self.out.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Out-edges of `node` whose id is strictly greater than `base`.
    pub fn any_after(&self, node: NodeIndex, base: i64) -> &[EdgeIndex] {
        let edges = self.out_edges(node);
        let start = edges.partition_point(|&e| self.graph.edge(e).seq <= base);
        &edges[start..]
    }

    /// The out-edge of `node` whose id is exactly `base + 1`, if any.
    ///
    /// When several edges share that id the one with the smallest
    /// destination-and-key pair wins.
    pub fn immediate_successor(&self, node: NodeIndex, base: i64) -> Option<EdgeIndex> {
        let wanted = base.checked_add(1)?;
        let edges = self.out_edges(node);
        let start = edges.partition_point(|&e| self.graph.edge(e).seq < wanted);
        let candidates = edges[start..]
            .iter()
            .take_while(|&&e| self.graph.edge(e).seq == wanted)
            .count();
        if candidates > 1 {
            tracing::warn!(
                "{} out-edges of node {} share id {wanted}; picking the first by destination and key",
                candidates,
                self.graph.node(node).id
            );
        }
        edges.get(start).copied().filter(|_| candidates > 0)
    }

    /// Follow `immediate_successor` from `edge` until the chain ends.
    ///
    /// The returned chain starts with `edge` itself.
    pub fn extend_chain(&self, edge: EdgeIndex) -> Vec<EdgeIndex> {
        let mut chain = vec![edge];
        let mut current = edge;
        while let Some((_, dest)) = self.graph.endpoints(current) {
            match self.immediate_successor(dest, self.graph.edge(current).seq) {
                Some(next) => {
                    chain.push(next);
                    current = next;
                }
                None => break,
            }
        }
        chain
    }

    /// All maximal flow paths rooted at `source`.
    pub fn flow_paths(&self, source: NodeIndex) -> FlowPaths<'_, 'g> {
        FlowPaths::new(self, source)
    }

    /// Breadth-first collection of every node reachable from `source` by
    /// edges with increasing ids.
    ///
    /// The first hop considers edges later than the source node's own `id`
    /// attribute (all edges when it has none); each later hop considers
    /// edges later than the edge it arrived by. Each edge is expanded once.
    pub fn reachable_nodes(&self, source: NodeIndex) -> BTreeSet<NodeIndex> {
        let mut touched = BTreeSet::from([source]);
        let mut seen: HashSet<EdgeIndex> = HashSet::new();
        let base = self.graph.node(source).seq.unwrap_or(i64::MIN);
        let mut queue: VecDeque<EdgeIndex> = self.any_after(source, base).iter().copied().collect();

        while let Some(edge) = queue.pop_front() {
            if !seen.insert(edge) {
                continue;
            }
            let Some((_, dest)) = self.graph.endpoints(edge) else {
                continue;
            };
            touched.insert(dest);
            let seq = self.graph.edge(edge).seq;
            queue.extend(
                self.any_after(dest, seq)
                    .iter()
                    .filter(|e| !seen.contains(*e)),
            );
        }
        touched
    }
}

// ---------------------------------------------------------------------------
// FlowPaths
// ---------------------------------------------------------------------------

/// Lazy sequence of maximal flow paths from one source node.
///
/// Every out-edge of the source sits in a working set. Each step takes the
/// remaining edge with the lowest id and extends it along immediate
/// successors; source out-edges consumed as links of that chain leave the
/// working set and never start a path of their own. Edges reached from
/// several predecessors appear in every such chain.
pub struct FlowPaths<'i, 'g> {
    index: &'i ForwardEdgeIndex<'g>,
    pending: BTreeSet<(i64, EdgeIndex)>,
}

impl<'i, 'g> FlowPaths<'i, 'g> {
    fn new(index: &'i ForwardEdgeIndex<'g>, source: NodeIndex) -> Self {
        let pending = index
            .out_edges(source)
            .iter()
            .map(|&e| (index.graph.edge(e).seq, e))
            .collect();
        Self { index, pending }
    }
}

impl Iterator for FlowPaths<'_, '_> {
    type Item = Vec<EdgeIndex>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, start) = self.pending.pop_first()?;
        let chain = self.index.extend_chain(start);
        for &link in &chain[1..] {
            self.pending.remove(&(self.index.graph.edge(link).seq, link));
        }
        Some(chain)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

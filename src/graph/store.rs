//! In-memory event graph store.
//!
//! A directed multigraph on top of `petgraph`, indexed by the document's node
//! ids and by `(origin, destination, key)` edge triples so candidate
//! artifacts can be resolved back to edges. The store is built once by the
//! loader and treated as read-only afterwards.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, EdgeIndex, EdgeReference, NodeIndex};

use crate::error::{FlowError, Result};
use crate::types::{EdgeDescriptor, EdgeKey, EventEdge, EventNode};

/// The recorded event graph.
#[derive(Debug, Default)]
pub struct EventGraph {
    graph: DiGraph<EventNode, EventEdge>,
    nodes: HashMap<String, NodeIndex>,
    edges: HashMap<(NodeIndex, NodeIndex, EdgeKey), EdgeIndex>,
}

impl EventGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------

    /// Insert a node, replacing the attributes of an existing node with the
    /// same id.
    pub fn add_node(&mut self, node: EventNode) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&node.id) {
            self.graph[idx] = node;
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.nodes.insert(id, idx);
        idx
    }

    /// Look up a node by id, creating an attribute-less one if absent.
    pub fn ensure_node(&mut self, id: &str) -> NodeIndex {
        match self.nodes.get(id) {
            Some(&idx) => idx,
            None => self.add_node(EventNode::bare(id)),
        }
    }

    /// Insert an edge between two nodes (created on demand).
    ///
    /// Fails when an edge with the same key already joins the same pair.
    pub fn add_edge(&mut self, origin: &str, destination: &str, edge: EventEdge) -> Result<EdgeIndex> {
        let from = self.ensure_node(origin);
        let to = self.ensure_node(destination);
        let triple = (from, to, edge.key.clone());
        if self.edges.contains_key(&triple) {
            return Err(FlowError::GraphFormat(format!(
                "duplicate edge ({origin}, {destination}, {})",
                edge.key
            )));
        }
        let idx = self.graph.add_edge(from, to, edge);
        self.edges.insert(triple, idx);
        Ok(idx)
    }

    /// The next unused integer key for edges from `origin` to `destination`.
    ///
    /// Starts at the number of existing parallel edges and counts up past any
    /// key already taken.
    pub fn next_key(&self, origin: &str, destination: &str) -> EdgeKey {
        let (Some(&from), Some(&to)) = (self.nodes.get(origin), self.nodes.get(destination)) else {
            return EdgeKey::Int(0);
        };
        let parallel = self.graph.edges_connecting(from, to).count() as i64;
        let mut key = parallel;
        while self.edges.contains_key(&(from, to, EdgeKey::Int(key))) {
            key += 1;
        }
        EdgeKey::Int(key)
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.nodes.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &EventNode {
        &self.graph[idx]
    }

    pub fn node_by_id(&self, id: &str) -> Option<&EventNode> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &EventNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    pub fn edge(&self, idx: EdgeIndex) -> &EventEdge {
        &self.graph[idx]
    }

    pub fn endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// Outgoing edges of a node, in no particular order.
    pub fn out_edges(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeReference<'_, EventEdge>> {
        self.graph.edges(idx)
    }

    /// The artifact-facing descriptor of an edge.
    pub fn descriptor(&self, idx: EdgeIndex) -> Option<EdgeDescriptor> {
        let (from, to) = self.endpoints(idx)?;
        let edge = &self.graph[idx];
        Some(EdgeDescriptor {
            origin: self.graph[from].id.clone(),
            destination: self.graph[to].id.clone(),
            key: edge.key.clone(),
            seq: Some(edge.seq),
        })
    }

    /// Resolve a descriptor back to an edge of this graph.
    pub fn resolve(&self, descriptor: &EdgeDescriptor) -> Result<EdgeIndex> {
        let from = self
            .node_index(&descriptor.origin)
            .ok_or_else(|| FlowError::UnknownNode(descriptor.origin.clone()))?;
        let to = self
            .node_index(&descriptor.destination)
            .ok_or_else(|| FlowError::UnknownNode(descriptor.destination.clone()))?;
        self.edges
            .get(&(from, to, descriptor.key.clone()))
            .copied()
            .ok_or_else(|| FlowError::UnknownEdge(descriptor.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_create_missing_endpoints() {
        let mut g = EventGraph::new();
        g.add_edge("a", "b", EventEdge::new(EdgeKey::Int(0), 1)).unwrap();
        assert_eq!(g.node_count(), 2);
        assert!(g.node_by_id("b").unwrap().node_type.is_none());
    }

    #[test]
    fn duplicate_edge_key_is_rejected() {
        let mut g = EventGraph::new();
        g.add_edge("a", "b", EventEdge::new(EdgeKey::Int(0), 1)).unwrap();
        let err = g.add_edge("a", "b", EventEdge::new(EdgeKey::Int(0), 2));
        assert!(matches!(err, Err(FlowError::GraphFormat(_))));
    }

    #[test]
    fn next_key_skips_taken_keys() {
        let mut g = EventGraph::new();
        assert_eq!(g.next_key("a", "b"), EdgeKey::Int(0));
        g.add_edge("a", "b", EventEdge::new(EdgeKey::Int(1), 1)).unwrap();
        // one parallel edge exists, so counting starts at 1, which is taken
        assert_eq!(g.next_key("a", "b"), EdgeKey::Int(2));
    }

    #[test]
    fn descriptor_resolves_back_to_edge() {
        let mut g = EventGraph::new();
        let e = g
            .add_edge("a", "b", EventEdge::new(EdgeKey::Str("x".into()), 9))
            .unwrap();
        let d = g.descriptor(e).unwrap();
        assert_eq!(d.seq, Some(9));
        assert_eq!(g.resolve(&d).unwrap(), e);
    }

    #[test]
    fn resolve_reports_unknown_edge() {
        let mut g = EventGraph::new();
        g.add_edge("a", "b", EventEdge::new(EdgeKey::Int(0), 1)).unwrap();
        let d = EdgeDescriptor {
            origin: "a".into(),
            destination: "b".into(),
            key: EdgeKey::Int(5),
            seq: None,
        };
        assert!(matches!(g.resolve(&d), Err(FlowError::UnknownEdge(_))));
        let d = EdgeDescriptor {
            origin: "zz".into(),
            ..d
        };
        assert!(matches!(g.resolve(&d), Err(FlowError::UnknownNode(_))));
    }

    #[test]
    fn re_adding_a_node_replaces_attributes() {
        let mut g = EventGraph::new();
        g.ensure_node("a");
        let mut node = EventNode::bare("a");
        node.method = Some("Location.href".into());
        g.add_node(node);
        assert_eq!(g.node_count(), 1);
        assert_eq!(
            g.node_by_id("a").unwrap().method.as_deref(),
            Some("Location.href")
        );
    }
}

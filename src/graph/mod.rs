//! Graph layer: in-memory event graph, GraphML loading, and temporal traversal.

pub mod graphml;
pub mod store;
pub mod traversal;

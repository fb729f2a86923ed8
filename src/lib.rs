//! Forward flows: taint-flow discovery over recorded browser event graphs.
//!
//! Finds chains of temporally consecutive events that lead from a
//! privacy-sensitive web API read to a storage write, corroborated by a
//! common substring between the value read and the value written.

pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod graph;
pub mod observability;
pub mod types;
pub mod viewer;

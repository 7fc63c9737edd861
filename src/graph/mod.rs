//! # Resource Graph
//!
//! Core graph model: hierarchical node IDs and the directed resource graph
//! the load pipeline builds, resolves and validates.
//!
//! ## Identity
//!
//! Vertex identity is a string path ([`NodeId`]), never an object handle.
//! All references between vertices resolve by lookup against the graph, so
//! no cyclic ownership can arise and the graph serializes trivially.
//!
//! ## Key Types
//!
//! - [`NodeId`] - slash-separated path rooted at `root`
//! - [`Graph`] - petgraph-backed DAG with duplicate refusal and validation
//! - [`GraphError`] - duplicate IDs, cycles, dangling edges

mod graph;
mod id;

pub use graph::{Graph, GraphError};
pub use id::{IdError, NodeId, ROOT};

//! Resource graph
//!
//! A directed graph of configuration resources keyed by hierarchical IDs.
//! An edge `u -> v` means "u requires v": v must be processed before u.
//! Uses petgraph for the underlying structure with a side map from
//! [`NodeId`] to node index, since all cross-references are by ID and
//! never by pointer.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt::Write as _;
use thiserror::Error;

use super::id::NodeId;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Duplicate node ID: {0}")]
    DuplicateId(NodeId),

    #[error("Dependency cycle: {}", display_path(.path))]
    Cycle { path: Vec<NodeId> },

    #[error("Edge to undeclared node: {from} -> {to}")]
    DanglingEdge { from: NodeId, to: NodeId },
}

fn display_path(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug)]
struct Vertex<T> {
    id: NodeId,

    /// None for the root vertex and for placeholder endpoints created by
    /// [`Graph::connect`]; placeholders are rejected by [`Graph::validate`].
    payload: Option<T>,
}

/// A directed graph of resources with a distinguished `root` vertex
#[derive(Debug)]
pub struct Graph<T> {
    graph: DiGraph<Vertex<T>, ()>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Graph<T> {
    /// Creates a graph holding only the payload-less `root` vertex
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let root = NodeId::root();
        let idx = graph.add_node(Vertex {
            id: root.clone(),
            payload: None,
        });
        node_map.insert(root, idx);
        Self { graph, node_map }
    }

    /// Adds a vertex. Refuses to add a second vertex with the same ID.
    pub fn add(&mut self, id: NodeId, payload: T) -> Result<(), GraphError> {
        if self.node_map.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        let idx = self.graph.add_node(Vertex {
            id: id.clone(),
            payload: Some(payload),
        });
        self.node_map.insert(id, idx);
        Ok(())
    }

    /// Connects `from -> to` ("from requires to"). Idempotent: re-adding an
    /// existing edge is a no-op. Unknown endpoints become placeholder
    /// vertices so that validation can report the dangling edge.
    pub fn connect(&mut self, from: &NodeId, to: &NodeId) {
        let from_idx = self.ensure_vertex(from);
        let to_idx = self.ensure_vertex(to);
        self.graph.update_edge(from_idx, to_idx, ());
    }

    fn ensure_vertex(&mut self, id: &NodeId) -> NodeIndex {
        if let Some(idx) = self.node_map.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(Vertex {
            id: id.clone(),
            payload: None,
        });
        self.node_map.insert(id.clone(), idx);
        idx
    }

    /// Returns true if the graph contains the given ID
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Returns the payload of a vertex, if present
    pub fn get(&self, id: &NodeId) -> Option<&T> {
        let idx = self.node_map.get(id)?;
        self.graph[*idx].payload.as_ref()
    }

    /// Returns true if the edge `from -> to` exists
    pub fn has_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(f), Some(t)) => self.graph.find_edge(*f, *t).is_some(),
            _ => false,
        }
    }

    /// Number of vertices, including root
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All vertex IDs, in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.graph.node_weights().map(|v| &v.id)
    }

    /// All vertices with their payloads, in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = (&NodeId, Option<&T>)> {
        self.graph.node_weights().map(|v| (&v.id, v.payload.as_ref()))
    }

    /// All edges as `(from, to)` ID pairs
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.graph.edge_indices().filter_map(|e| {
            let (a, b) = self.graph.edge_endpoints(e)?;
            Some((&self.graph[a].id, &self.graph[b].id))
        })
    }

    /// Direct requirements of a vertex (outgoing neighbors)
    pub fn dependencies(&self, id: &NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Vertices that require this one (incoming neighbors)
    pub fn dependents(&self, id: &NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &NodeId, dir: Direction) -> Vec<NodeId> {
        let idx = match self.node_map.get(id) {
            Some(idx) => *idx,
            None => return vec![],
        };
        self.graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].id.clone())
            .collect()
    }

    /// Checks the post-resolution invariants: no cycles, no dangling edges.
    pub fn validate(&self) -> Result<(), GraphError> {
        if let Some(path) = self.find_cycle() {
            return Err(GraphError::Cycle { path });
        }

        for idx in self.graph.node_indices() {
            let vertex = &self.graph[idx];
            if vertex.id.is_root() || vertex.payload.is_some() {
                continue;
            }
            // placeholder vertex: some edge points at a node nobody declared
            let from = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .map(|n| self.graph[n].id.clone())
                .unwrap_or_else(NodeId::root);
            return Err(GraphError::DanglingEdge {
                from,
                to: vertex.id.clone(),
            });
        }

        Ok(())
    }

    /// Returns all vertex IDs in execution order: requirements before the
    /// vertices that require them, root last.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, GraphError> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .rev()
                .map(|idx| self.graph[idx].id.clone())
                .collect()),
            Err(_) => {
                let path = self.find_cycle().unwrap_or_default();
                Err(GraphError::Cycle { path })
            }
        }
    }

    /// Depth-first cycle search with grey/black coloring. Returns the
    /// offending path, first vertex repeated at the end.
    fn find_cycle(&self) -> Option<Vec<NodeId>> {
        // node indices are contiguous: vertices are never removed
        let mut color = vec![Color::White; self.graph.node_count()];
        let mut path = Vec::new();

        for start in self.graph.node_indices() {
            if color[start.index()] == Color::White {
                if let Some(cycle) = self.visit(start, &mut color, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit(
        &self,
        v: NodeIndex,
        color: &mut [Color],
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeId>> {
        color[v.index()] = Color::Grey;
        path.push(v);

        for n in self.graph.neighbors(v) {
            match color[n.index()] {
                Color::Grey => {
                    // grey-grey back-edge: the cycle runs from n's position
                    // on the current path back around to n
                    let pos = path.iter().position(|&x| x == n).unwrap_or(0);
                    let mut cycle: Vec<NodeId> = path[pos..]
                        .iter()
                        .map(|&i| self.graph[i].id.clone())
                        .collect();
                    cycle.push(self.graph[n].id.clone());
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.visit(n, color, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        color[v.index()] = Color::Black;
        None
    }

    /// Consumes the graph, transforming every payload while preserving IDs
    /// and edges. The sole mutation mechanism used by the hydration stage.
    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(&NodeId, T) -> Result<U, E>,
    ) -> Result<Graph<U>, E> {
        let (nodes, edges) = self.graph.into_nodes_edges();

        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut node_map = HashMap::with_capacity(nodes.len());

        // indices are preserved because nodes are re-added in index order
        for node in nodes {
            let Vertex { id, payload } = node.weight;
            let payload = match payload {
                Some(p) => Some(f(&id, p)?),
                None => None,
            };
            let idx = graph.add_node(Vertex {
                id: id.clone(),
                payload,
            });
            node_map.insert(id, idx);
        }
        for edge in &edges {
            graph.update_edge(edge.source(), edge.target(), ());
        }

        Ok(Graph { graph, node_map })
    }

    /// Dumps the graph as a DOT listing: ID-sorted vertices (labelled by
    /// `describe` when it returns a value) followed by ID-sorted edges.
    pub fn dot(&self, mut describe: impl FnMut(&T) -> Option<String>) -> String {
        let mut out = String::from("digraph {\n");

        let mut vertices: Vec<_> = self
            .graph
            .node_weights()
            .map(|v| (v.id.as_str(), v.payload.as_ref().and_then(&mut describe)))
            .collect();
        vertices.sort();
        for (id, label) in vertices {
            match label {
                Some(label) => {
                    let _ = writeln!(out, "  \"{}\" [label=\"{}\\n{}\"]", id, id, label);
                }
                None => {
                    let _ = writeln!(out, "  \"{}\"", id);
                }
            }
        }

        let mut edges: Vec<_> = self
            .edges()
            .map(|(from, to)| (from.as_str(), to.as_str()))
            .collect();
        edges.sort();
        for (from, to) in edges {
            let _ = writeln!(out, "  \"{}\" -> \"{}\"", from, to);
        }

        out.push_str("}\n");
        out
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Grey,
    Black,
}

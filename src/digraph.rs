// In-memory directed graph over sequence-bearing vertices
//
// The container is pre-sized from the converter's preprocessing result and
// populated in place: vertices first, then edges, then per-vertex path
// positions. Vertex slots are optional so a sparse external id space leaves
// gaps without shifting internal ids.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[path = "digraph_test.rs"]
mod digraph_test;

/// Dense zero-based vertex identifier.
pub type NodeId = usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node id {id} out of range for a graph sized {capacity}")]
    IdOutOfRange { id: NodeId, capacity: usize },
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("path {path} is already recorded at offset {offset}")]
    DuplicatePathPosition { path: usize, offset: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn flip(self) -> Orientation {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }
}

/// An oriented view of a vertex, the endpoint type of every edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pub node: NodeId,
    pub orientation: Orientation,
}

impl Handle {
    pub fn new(node: NodeId, orientation: Orientation) -> Self {
        Handle { node, orientation }
    }
}

/// Directed edge between two oriented vertices. Self-loops and parallel
/// edges are permitted and never deduplicated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: Handle,
    pub to: Handle,
}

/// Opaque reference to a path owned by the graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathHandle(usize);

impl PathHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A sequence-bearing vertex.
///
/// Stores the segment sequence, adjacency (as indices into the graph's edge
/// list), and for every path that traverses this vertex the ordered set of
/// path-local starting offsets. A vertex may occur on the same path more
/// than once, so offsets form a set per path handle.
#[derive(Debug, Default)]
pub struct Vertex {
    sequence: String,
    path_positions: BTreeMap<PathHandle, BTreeSet<usize>>,
    in_edges: Vec<usize>,
    out_edges: Vec<usize>,
}

impl Vertex {
    fn new(sequence: String) -> Self {
        Vertex {
            sequence,
            ..Vertex::default()
        }
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Record that `path` starts a visit of this vertex at `offset`.
    ///
    /// An exact duplicate association is rejected; the caller decides
    /// whether that is fatal.
    pub fn add_path_position(&mut self, path: PathHandle, offset: usize) -> Result<(), GraphError> {
        if self.path_positions.entry(path).or_default().insert(offset) {
            Ok(())
        } else {
            Err(GraphError::DuplicatePathPosition {
                path: path.index(),
                offset,
            })
        }
    }

    pub fn path_positions(&self, path: PathHandle) -> Option<&BTreeSet<usize>> {
        self.path_positions.get(&path)
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathHandle, &BTreeSet<usize>)> {
        self.path_positions.iter().map(|(h, p)| (*h, p))
    }

    pub fn in_degree(&self) -> usize {
        self.in_edges.len()
    }

    pub fn out_degree(&self) -> usize {
        self.out_edges.len()
    }
}

/// Directed graph owning all vertices, edges, and paths.
#[derive(Debug, Default)]
pub struct DiGraph {
    vertices: Vec<Option<Vertex>>,
    node_count: usize,
    edges: Vec<Edge>,
    path_names: Vec<String>,
    start_nodes: BTreeSet<NodeId>,
    stop_nodes: BTreeSet<NodeId>,
}

impl DiGraph {
    /// Create a graph sized for `max_nodes` vertex slots and `path_count`
    /// paths, so ingestion never reallocates.
    pub fn with_capacity(max_nodes: usize, path_count: usize) -> Self {
        let mut vertices = Vec::with_capacity(max_nodes);
        vertices.resize_with(max_nodes, || None);
        DiGraph {
            vertices,
            path_names: Vec::with_capacity(path_count),
            ..DiGraph::default()
        }
    }

    /// Number of vertices actually created (not slot capacity).
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn path_count(&self) -> usize {
        self.path_names.len()
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.vertices.get(id).is_some_and(|v| v.is_some())
    }

    /// Create the vertex at `id` with the given sequence.
    pub fn create_handle(&mut self, sequence: &str, id: NodeId) -> Result<Handle, GraphError> {
        if id >= self.vertices.len() {
            return Err(GraphError::IdOutOfRange {
                id,
                capacity: self.vertices.len(),
            });
        }
        if self.vertices[id].is_some() {
            return Err(GraphError::DuplicateNode(id));
        }
        self.vertices[id] = Some(Vertex::new(sequence.to_string()));
        self.node_count += 1;
        Ok(Handle::new(id, Orientation::Forward))
    }

    /// Look up an oriented handle to an existing vertex.
    pub fn get_handle(&self, id: NodeId, orientation: Orientation) -> Result<Handle, GraphError> {
        if self.has_node(id) {
            Ok(Handle::new(id, orientation))
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    pub fn create_edge(&mut self, from: Handle, to: Handle) -> Result<(), GraphError> {
        for endpoint in [from.node, to.node] {
            if !self.has_node(endpoint) {
                return Err(GraphError::UnknownNode(endpoint));
            }
        }
        let idx = self.edges.len();
        self.edges.push(Edge { from, to });
        self.vertices[from.node].as_mut().unwrap().out_edges.push(idx);
        self.vertices[to.node].as_mut().unwrap().in_edges.push(idx);
        Ok(())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertex(&self, id: NodeId) -> Option<&Vertex> {
        self.vertices.get(id).and_then(|v| v.as_ref())
    }

    pub fn get_vertex_mut(&mut self, id: NodeId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id).and_then(|v| v.as_mut())
    }

    pub fn sequence(&self, id: NodeId) -> Option<&str> {
        self.vertex(id).map(|v| v.sequence())
    }

    /// Internal ids of the vertices that exist, in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(id, v)| v.as_ref().map(|_| id))
    }

    /// Allocate a handle for a new named path.
    pub fn create_path_handle(&mut self, name: &str) -> PathHandle {
        self.path_names.push(name.to_string());
        PathHandle(self.path_names.len() - 1)
    }

    pub fn path_name(&self, path: PathHandle) -> Option<&str> {
        self.path_names.get(path.index()).map(|s| s.as_str())
    }

    pub fn path_handles(&self) -> impl Iterator<Item = PathHandle> + '_ {
        (0..self.path_names.len()).map(PathHandle)
    }

    pub fn path_positions(&self, id: NodeId, path: PathHandle) -> Option<&BTreeSet<usize>> {
        self.vertex(id).and_then(|v| v.path_positions(path))
    }

    /// Classify every vertex with no incoming edges as a start node.
    pub fn compute_start_nodes(&mut self) {
        self.start_nodes = self
            .vertices
            .par_iter()
            .enumerate()
            .filter_map(|(id, v)| match v {
                Some(v) if v.in_edges.is_empty() => Some(id),
                _ => None,
            })
            .collect();
    }

    /// Classify every vertex with no outgoing edges as a stop node.
    pub fn compute_stop_nodes(&mut self) {
        self.stop_nodes = self
            .vertices
            .par_iter()
            .enumerate()
            .filter_map(|(id, v)| match v {
                Some(v) if v.out_edges.is_empty() => Some(id),
                _ => None,
            })
            .collect();
    }

    pub fn start_nodes(&self) -> &BTreeSet<NodeId> {
        &self.start_nodes
    }

    pub fn stop_nodes(&self) -> &BTreeSet<NodeId> {
        &self.stop_nodes
    }

    pub fn is_start_node(&self, id: NodeId) -> bool {
        self.start_nodes.contains(&id)
    }

    pub fn is_stop_node(&self, id: NodeId) -> bool {
        self.stop_nodes.contains(&id)
    }
}

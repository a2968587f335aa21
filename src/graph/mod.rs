mod builder;

pub use builder::CallGraphBuilder;

use crate::model::{ClassId, MethodId, ReferenceKind, Resolution};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A node of the usage graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKind {
    /// Index into the template slice the graph was built from
    Template(usize),
    Class(ClassId),
    Method(MethodId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    /// Template reference to a method, or to a class node when opaque
    TemplateRef(ReferenceKind, Resolution),
    /// Template binds a ViewModel class
    Binding,
    /// Class visible at an include site -> class bound by the included template
    Inclusion,
    /// Direct invocation found in a method body or initializer
    InternalCall,
    /// `new T(...)` of an indexed class
    Instantiation,
    /// Base slot -> same-slot override
    Dispatch,
}

impl EdgeKind {
    pub fn is_opaque_ref(&self, kind: ReferenceKind) -> bool {
        matches!(self, EdgeKind::TemplateRef(k, Resolution::Opaque) if *k == kind)
    }

    pub fn is_static_ref(&self) -> bool {
        matches!(self, EdgeKind::TemplateRef(_, resolution) if resolution.is_static())
    }
}

/// An edge with the source location that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub path: PathBuf,
    pub line: usize,
}

impl Edge {
    pub fn new(kind: EdgeKind, path: &Path, line: usize) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            line,
        }
    }
}

/// The usage graph: templates, classes and methods, and how they reach each other
#[derive(Debug, Default)]
pub struct UsageGraph {
    /// The underlying directed graph
    inner: DiGraph<NodeKind, Edge>,

    /// Map from node identity to node index
    node_map: HashMap<NodeKind, NodeIndex>,
}

impl UsageGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning the existing index if it is already present
    pub fn add_node(&mut self, node: NodeKind) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&node) {
            return index;
        }
        let index = self.inner.add_node(node);
        self.node_map.insert(node, index);
        index
    }

    /// Add an edge between two known nodes; returns false if either endpoint is unknown
    pub fn add_edge(&mut self, from: NodeKind, to: NodeKind, edge: Edge) -> bool {
        match (self.node_map.get(&from), self.node_map.get(&to)) {
            (Some(&from_idx), Some(&to_idx)) => {
                self.inner.add_edge(from_idx, to_idx, edge);
                true
            }
            _ => false,
        }
    }

    /// Get node index for a node identity
    pub fn node_index(&self, node: NodeKind) -> Option<NodeIndex> {
        self.node_map.get(&node).copied()
    }

    pub fn node(&self, index: NodeIndex) -> NodeKind {
        self.inner[index]
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeKind> + '_ {
        self.inner.node_weights().copied()
    }

    /// Incoming edges of a node, with their source
    pub fn edges_into(&self, node: NodeKind) -> Vec<(NodeKind, &Edge)> {
        self.edges(node, Direction::Incoming)
    }

    /// Outgoing edges of a node, with their target
    pub fn edges_from(&self, node: NodeKind) -> Vec<(NodeKind, &Edge)> {
        self.edges(node, Direction::Outgoing)
    }

    fn edges(&self, node: NodeKind, direction: Direction) -> Vec<(NodeKind, &Edge)> {
        let Some(index) = self.node_index(node) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(index, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (self.inner[other], edge.weight())
            })
            .collect()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Count edges of each kind, for logging
    pub fn edge_counts(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for edge in self.inner.edge_weights() {
            let name = match edge.kind {
                EdgeKind::TemplateRef(..) => "template_ref",
                EdgeKind::Binding => "binding",
                EdgeKind::Inclusion => "inclusion",
                EdgeKind::InternalCall => "internal_call",
                EdgeKind::Instantiation => "instantiation",
                EdgeKind::Dispatch => "dispatch",
            };
            *counts.entry(name).or_insert(0) += 1;
        }
        counts
    }

    /// Get the underlying petgraph for traversal
    pub fn inner(&self) -> &DiGraph<NodeKind, Edge> {
        &self.inner
    }
}

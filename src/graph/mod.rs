//! Approximate dependency graph between legacy items and the files that
//! reference them.
//!
//! Nodes are keyed by repository-relative path (libraries by their
//! `<manifest>:<name>` path). An edge `a -> b` means "a references b".
//! Parallel edges are kept; neighbour queries deduplicate.

mod builder;

pub use builder::{build, build_with_exclusions};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::detection::ItemType;

/// Why one node references another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    CodeDependency,
    ImportDependency,
    ConfigDependency,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::CodeDependency => "code_dependency",
            EdgeType::ImportDependency => "import_dependency",
            EdgeType::ConfigDependency => "config_dependency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub node_type: ItemType,
    pub risk_score: f64,
    pub size_kb: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct GraphNode {
    id: String,
    attributes: NodeAttributes,
}

/// Summary counts written to the assessment report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub connected_components: usize,
    pub edges_by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, EdgeType>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, or return the existing one with the same id.
    pub fn add_node(&mut self, id: &str, attributes: NodeAttributes) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode {
            id: id.to_string(),
            attributes,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add `source -> target`. Both nodes must already exist.
    pub fn add_edge(&mut self, source: &str, target: &str, edge_type: EdgeType) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&s), Some(&t)) => {
                self.graph.add_edge(s, t, edge_type);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn attributes(&self, id: &str) -> Option<&NodeAttributes> {
        self.index.get(id).map(|&idx| &self.graph[idx].attributes)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Nodes `id` references, sorted and deduplicated.
    pub fn successors(&self, id: &str) -> Vec<String> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Nodes that reference `id`, sorted and deduplicated.
    pub fn predecessors(&self, id: &str) -> Vec<String> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Components of the graph with edge direction ignored.
    ///
    /// Each component is sorted; components are ordered by their first id.
    pub fn weakly_connected_components(&self) -> Vec<Vec<String>> {
        let mut sets = UnionFind::<usize>::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }
        let mut groups: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for idx in self.graph.node_indices() {
            groups
                .entry(sets.find(idx.index()))
                .or_default()
                .push(self.graph[idx].id.clone());
        }
        let mut components: Vec<Vec<String>> = groups
            .into_values()
            .map(|mut ids| {
                ids.sort();
                ids
            })
            .collect();
        components.sort();
        components
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All edges as `(source, target, type)`, in insertion order.
    pub fn edges(&self) -> Vec<(String, String, EdgeType)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id.clone(),
                    self.graph[e.target()].id.clone(),
                    *e.weight(),
                )
            })
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        let mut edges_by_type = BTreeMap::new();
        for edge in self.graph.edge_references() {
            *edges_by_type
                .entry(edge.weight().as_str().to_string())
                .or_insert(0) += 1;
        }
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            connected_components: self.weakly_connected_components().len(),
            edges_by_type,
        }
    }
}

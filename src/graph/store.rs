//! In-memory relationship graph
//!
//! An undirected simple graph over person ids. Each unordered pair holds at
//! most one edge; adding an edge for an existing pair merges the new
//! attributes over the old ones, so the last write wins per attribute.
//! Node and edge iteration follow insertion order.

use super::edge::{attr as edge_attr, Edge};
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use super::types::{NodeId, PairKey};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge between {0} and {1} not found")]
    EdgeNotFound(NodeId, NodeId),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Summary counts for a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    /// Nodes without any incident edge
    pub isolated_nodes: usize,
    pub self_loops: usize,
    /// Edge count per `label` attribute
    pub edges_by_label: BTreeMap<String, usize>,
}

/// Undirected relationship graph
#[derive(Debug, Clone, Default)]
pub struct SocialGraph {
    /// Node storage in insertion order
    nodes: IndexMap<NodeId, Node>,

    /// Edge storage keyed by unordered pair, in insertion order
    edges: IndexMap<PairKey, Edge>,

    /// Neighbor sets (both directions)
    adjacency: HashMap<NodeId, IndexSet<NodeId>>,
}

impl SocialGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from stored nodes and edges
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node.id, node.properties);
        }
        for edge in edges {
            graph.add_edge(edge.source, edge.target, edge.properties);
        }
        graph
    }

    /// Add a node, or merge attributes into an existing one
    pub fn add_node(&mut self, id: NodeId, properties: PropertyMap) -> &mut Node {
        self.adjacency.entry(id).or_default();
        let node = self.nodes.entry(id).or_insert_with(|| Node::new(id));
        node.properties.extend(properties);
        node
    }

    /// Add an undirected edge.
    ///
    /// Missing endpoints are created without attributes. If the pair already
    /// has an edge, `properties` are merged over the existing attributes.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, properties: PropertyMap) -> &mut Edge {
        self.add_node(u, PropertyMap::new());
        self.add_node(v, PropertyMap::new());

        if let Some(set) = self.adjacency.get_mut(&u) {
            set.insert(v);
        }
        if let Some(set) = self.adjacency.get_mut(&v) {
            set.insert(u);
        }

        let edge = self
            .edges
            .entry(PairKey::new(u, v))
            .or_insert_with(|| Edge::new(u, v));
        edge.properties.extend(properties);
        edge
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Set a property on an existing node, returning the previous value
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<Option<PropertyValue>> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        Ok(node.set_property(key, value))
    }

    pub fn get_edge(&self, u: NodeId, v: NodeId) -> Option<&Edge> {
        self.edges.get(&PairKey::new(u, v))
    }

    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.edges.contains_key(&PairKey::new(u, v))
    }

    /// Neighbors of a node in insertion order (empty for unknown nodes)
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.get(&id).into_iter().flat_map(|set| set.iter().copied())
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(&id).map_or(0, |set| set.len())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    /// Nodes that are an endpoint of at least one edge
    pub fn connected_nodes(&self) -> HashSet<NodeId> {
        self.edges
            .values()
            .flat_map(|e| [e.source, e.target])
            .collect()
    }

    /// Subgraph induced by `keep`; node and edge order follow this graph
    pub fn induced_subgraph(&self, keep: &HashSet<NodeId>) -> SocialGraph {
        let mut sub = SocialGraph::new();
        for node in self.nodes.values().filter(|n| keep.contains(&n.id)) {
            sub.add_node(node.id, node.properties.clone());
        }
        for edge in self
            .edges
            .values()
            .filter(|e| keep.contains(&e.source) && keep.contains(&e.target))
        {
            sub.add_edge(edge.source, edge.target, edge.properties.clone());
        }
        sub
    }

    /// Subgraph induced by the given targets and their neighbors.
    ///
    /// Targets that are not nodes of this graph are ignored.
    pub fn content_neighborhood(&self, targets: impl IntoIterator<Item = NodeId>) -> SocialGraph {
        let mut keep = HashSet::new();
        for target in targets {
            if self.has_node(target) {
                keep.insert(target);
                keep.extend(self.neighbors(target));
            }
        }
        self.induced_subgraph(&keep)
    }

    pub fn statistics(&self) -> GraphStatistics {
        let mut edges_by_label = BTreeMap::new();
        let mut self_loops = 0;
        for edge in self.edges.values() {
            if edge.is_self_loop() {
                self_loops += 1;
            }
            let label = edge.label().unwrap_or("unlabeled").to_string();
            *edges_by_label.entry(label).or_insert(0) += 1;
        }

        GraphStatistics {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            isolated_nodes: self.adjacency.values().filter(|set| set.is_empty()).count(),
            self_loops,
            edges_by_label,
        }
    }

    /// Append a label and connection id to the pair's list attributes
    pub(crate) fn record_edge_history(&mut self, u: NodeId, v: NodeId, label: &str, unique_id: i64) -> GraphResult<()> {
        let edge = self
            .edges
            .get_mut(&PairKey::new(u, v))
            .ok_or(GraphError::EdgeNotFound(u, v))?;
        for (key, value) in [(edge_attr::LABELS, label.to_string()), (edge_attr::UNIQUE_IDS, unique_id.to_string())] {
            match edge.properties.get_mut(key) {
                Some(PropertyValue::StringList(list)) => list.push(value),
                _ => {
                    edge.properties.insert(key.to_string(), PropertyValue::StringList(vec![value]));
                }
            }
        }
        Ok(())
    }
}

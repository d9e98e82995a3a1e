//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of the graph topology for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (profile ids are signed 64-bit integers)
pub type NodeId = i64;

/// A dense, integer-indexed view of an undirected graph using Compressed Sparse Row (CSR) format.
///
/// Every edge is materialized in both directions, so `successors` of a node
/// is its full neighbor set.
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Offsets into `out_targets`. Size = node_count + 1
    pub out_offsets: Vec<usize>,
    /// Contiguous array of neighbor node indices
    pub out_targets: Vec<usize>,
    /// Edge weights, aligned with `out_targets`
    pub weights: Vec<f64>,
}

impl GraphView {
    /// Neighbors of a node
    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.out_targets[self.out_offsets[idx]..self.out_offsets[idx + 1]]
    }

    /// Iterate `(neighbor_index, weight)` pairs for a node
    pub fn weighted_successors(&self, idx: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.out_offsets[idx]..self.out_offsets[idx + 1];
        self.out_targets[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    /// Build an undirected view from a node list and an edge list.
    ///
    /// Each `(u, v, weight)` pair is stored in both directions. Endpoints that
    /// are not in `nodes` are skipped, self-loops are kept as a single entry.
    pub fn from_undirected_edges(nodes: &[NodeId], edges: &[(NodeId, NodeId, f64)]) -> Self {
        let node_count = nodes.len();
        let mut index_to_node = Vec::with_capacity(node_count);
        let mut node_to_index = HashMap::with_capacity(node_count);
        for (idx, &id) in nodes.iter().enumerate() {
            index_to_node.push(id);
            node_to_index.insert(id, idx);
        }

        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); node_count];
        for &(u, v, w) in edges {
            let (Some(&u_idx), Some(&v_idx)) = (node_to_index.get(&u), node_to_index.get(&v)) else {
                continue;
            };
            adjacency[u_idx].push((v_idx, w));
            if u_idx != v_idx {
                adjacency[v_idx].push((u_idx, w));
            }
        }

        let mut out_offsets = Vec::with_capacity(node_count + 1);
        let mut out_targets = Vec::new();
        let mut weights = Vec::new();
        out_offsets.push(0);
        for neighbors in adjacency {
            for (target, w) in neighbors {
                out_targets.push(target);
                weights.push(w);
            }
            out_offsets.push(out_targets.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            out_offsets,
            out_targets,
            weights,
        }
    }
}

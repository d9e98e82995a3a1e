//! Graph algorithms module
//!
//! Algorithms live in the `wildnet-graph-algorithms` crate and run over a
//! CSR `GraphView`. This module provides the integration/adapter layer.

use crate::graph::SocialGraph;
use wildnet_graph_algorithms::{GraphView, NodeId as AlgoNodeId};

// Re-export algorithms
pub use wildnet_graph_algorithms::{
    component_indices, harmonic_function, ComponentSolve, HarmonicConfig, HarmonicResult,
    PropagationError, SolveMethod, Solver,
};

/// Build an undirected GraphView from the store for algorithm execution.
///
/// Every edge is stored in both directions. With `weight_property` set, an
/// integer or float edge attribute of that name becomes the edge weight;
/// edges without it weigh 1.0.
pub fn build_view(graph: &SocialGraph, weight_property: Option<&str>) -> GraphView {
    let nodes: Vec<AlgoNodeId> = graph.node_ids().map(|id| id.as_i64()).collect();

    let edges: Vec<(AlgoNodeId, AlgoNodeId, f64)> = graph
        .edges()
        .map(|edge| {
            let w = weight_property
                .and_then(|p| edge.get_property(p))
                .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                .unwrap_or(1.0);
            (edge.source.as_i64(), edge.target.as_i64(), w)
        })
        .collect();

    GraphView::from_undirected_edges(&nodes, &edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeId, PropertyMap, PropertyValue};

    #[test]
    fn test_build_view_is_symmetric() {
        let mut graph = SocialGraph::new();
        graph.add_node(NodeId(7), PropertyMap::new());
        graph.add_edge(NodeId(1), NodeId(2), PropertyMap::new());
        graph.add_edge(NodeId(2), NodeId(3), PropertyMap::new());

        let view = build_view(&graph, None);
        assert_eq!(view.node_count, 4);
        let idx = |id: i64| view.node_to_index[&id];
        assert_eq!(view.successors(idx(2)).len(), 2);
        assert_eq!(view.successors(idx(1)).len(), 1);
        assert_eq!(view.successors(idx(7)).len(), 0);
        assert!(view.successors(idx(3)).contains(&idx(2)));
    }

    #[test]
    fn test_build_view_weights() {
        let mut graph = SocialGraph::new();
        let mut props = PropertyMap::new();
        props.insert("weight".to_string(), PropertyValue::Integer(3));
        graph.add_edge(NodeId(1), NodeId(2), props);
        graph.add_edge(NodeId(2), NodeId(3), PropertyMap::new());

        let view = build_view(&graph, Some("weight"));
        let weights: Vec<(usize, f64)> = view.weighted_successors(view.node_to_index[&2]).collect();
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        assert_eq!(total, 4.0);

        assert_eq!(component_indices(&view).len(), 1);
    }
}

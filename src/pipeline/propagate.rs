//! Label propagation over the relationship graph
//!
//! Seeds are read from the `label` node attribute, so the graph alone
//! carries everything propagation needs.

use super::seed::SeedLabel;
use crate::algo::{build_view, harmonic_function, ComponentSolve, HarmonicConfig, PropagationError};
use crate::graph::node::attr;
use crate::graph::{NodeId, SocialGraph};
use std::collections::HashMap;
use tracing::{info, warn};

/// Predicted class for one node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePrediction {
    pub label: SeedLabel,
    /// Probability mass of the winning class
    pub confidence: f64,
    /// Set when the node's component hit the iteration cap
    pub provisional: bool,
}

/// Result of propagating labels over a graph
#[derive(Debug, Default)]
pub struct PropagationOutcome {
    pub predictions: HashMap<NodeId, NodePrediction>,
    /// Components without any seed, each as a sorted node list
    pub unresolved: Vec<Vec<NodeId>>,
    /// Nodes of capped components that no class mass reached; they get no
    /// prediction but are flagged provisional on export. Sorted.
    pub unreached_provisional: Vec<NodeId>,
    /// Components that failed for any other reason
    pub failures: Vec<PropagationError>,
    pub components: Vec<ComponentSolve>,
    /// Number of seeded nodes found in the graph
    pub seeded: usize,
}

impl PropagationOutcome {
    pub fn prediction(&self, id: NodeId) -> Option<&NodePrediction> {
        self.predictions.get(&id)
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved.iter().map(Vec::len).sum()
    }

    pub fn converged(&self) -> bool {
        self.components.iter().all(|c| c.converged)
    }

    /// Provisional nodes, with or without a prediction
    pub fn provisional_count(&self) -> usize {
        self.predictions.values().filter(|p| p.provisional).count() + self.unreached_provisional.len()
    }
}

/// Seed classes from the `label` attribute; unknown labels are ignored
fn read_seeds(graph: &SocialGraph) -> HashMap<i64, usize> {
    let mut seeds = HashMap::new();
    for node in graph.nodes() {
        let Some(value) = node.get_property(attr::LABEL) else {
            continue;
        };
        match value.as_string().map(str::parse::<SeedLabel>) {
            Some(Ok(label)) => {
                seeds.insert(node.id.as_i64(), label.class_index());
            }
            _ => warn!("Ignoring unrecognised label {} on node {}", value, node.id),
        }
    }
    seeds
}

/// Run harmonic-function propagation over `graph`.
///
/// Components with no seeded node are reported in `unresolved` and the rest
/// of the graph is still labeled.
pub fn propagate_labels(
    graph: &SocialGraph,
    config: &HarmonicConfig,
) -> Result<PropagationOutcome, PropagationError> {
    let seeds = read_seeds(graph);
    let view = build_view(graph, None);
    info!(
        "Propagating labels over {} nodes from {} seeds",
        view.node_count,
        seeds.len()
    );

    let result = harmonic_function(&view, &seeds, SeedLabel::CLASSES.len(), config)?;

    let mut outcome = PropagationOutcome {
        seeded: seeds.len(),
        components: result.components,
        unreached_provisional: result.unreached.iter().copied().map(NodeId).collect(),
        ..PropagationOutcome::default()
    };

    for (id, class) in result.labels {
        let Some(label) = SeedLabel::from_class_index(class) else {
            continue;
        };
        let confidence = result
            .distributions
            .get(&id)
            .and_then(|d| d.get(class))
            .copied()
            .unwrap_or(1.0);
        outcome.predictions.insert(
            NodeId(id),
            NodePrediction {
                label,
                confidence,
                provisional: result.provisional.contains(&id),
            },
        );
    }

    for failure in result.failures {
        match failure {
            PropagationError::UnreachableComponent { nodes } => {
                warn!(
                    "No labeled neighbors reachable from {} node(s), leaving them unresolved",
                    nodes.len()
                );
                outcome.unresolved.push(nodes.into_iter().map(NodeId).collect());
            }
            other => {
                warn!("Propagation failed for a component: {}", other);
                outcome.failures.push(other);
            }
        }
    }

    if !outcome.converged() {
        warn!("Iterative solve hit the iteration cap; affected predictions are provisional");
    }
    if !outcome.unreached_provisional.is_empty() {
        warn!(
            "{} node(s) were not reached before the iteration cap and have no prediction: {:?}",
            outcome.unreached_provisional.len(),
            outcome.unreached_provisional
        );
    }
    info!(
        "Resolved {} nodes, {} unresolved",
        outcome.predictions.len(),
        outcome.unresolved_count()
    );
    Ok(outcome)
}

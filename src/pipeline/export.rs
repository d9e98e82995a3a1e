//! Prediction attachment

use super::aggregate::SuspicionScores;
use super::propagate::PropagationOutcome;
use crate::graph::node::attr;
use crate::graph::{NodeId, PropertyValue, SocialGraph};
use tracing::debug;

/// Marker stored in `llm_based_prediction` for profiles without content
pub const NO_POST_DATA: &str = "no post data";

/// Attach prediction attributes to every node of `graph`.
///
/// Resolved nodes get `graph_based_prediction` and `graph_based_confidence`
/// (plus `graph_prediction_provisional` when the solve did not converge).
/// Nodes a capped solve never reached only get the provisional flag;
/// unresolved nodes get none of them. Every node gets
/// `llm_based_prediction`: its aggregated score, or [`NO_POST_DATA`].
/// Returns the number of nodes that received a graph prediction.
pub fn attach_predictions(graph: &mut SocialGraph, outcome: &PropagationOutcome, scores: &SuspicionScores) -> usize {
    let ids: Vec<NodeId> = graph.node_ids().collect();
    let mut predicted = 0;

    for id in ids {
        let Some(node) = graph.get_node_mut(id) else {
            continue;
        };

        node.remove_property(attr::GRAPH_PREDICTION);
        node.remove_property(attr::GRAPH_CONFIDENCE);
        node.remove_property(attr::GRAPH_PROVISIONAL);
        if let Some(prediction) = outcome.prediction(id) {
            node.set_property(attr::GRAPH_PREDICTION, prediction.label.as_str());
            node.set_property(attr::GRAPH_CONFIDENCE, prediction.confidence);
            if prediction.provisional {
                node.set_property(attr::GRAPH_PROVISIONAL, true);
            }
            predicted += 1;
        } else if outcome.unreached_provisional.contains(&id) {
            node.set_property(attr::GRAPH_PROVISIONAL, true);
        }

        let llm = match scores.get(id.as_i64()) {
            Some(total) => PropertyValue::Integer(total),
            None => PropertyValue::String(NO_POST_DATA.to_string()),
        };
        node.set_property(attr::LLM_PREDICTION, llm);
    }

    debug!("Attached graph predictions to {} of {} nodes", predicted, graph.node_count());
    predicted
}

//! Node implementation for the relationship graph

use super::property::{PropertyMap, PropertyValue};
use super::types::NodeId;
use serde::{Deserialize, Serialize};

/// Well-known node attribute names
pub mod attr {
    pub const REGION: &str = "region";
    /// Seed label (`suspicious` / `not_suspicious`)
    pub const LABEL: &str = "label";
    pub const GRAPH_PREDICTION: &str = "graph_based_prediction";
    pub const GRAPH_CONFIDENCE: &str = "graph_based_confidence";
    /// Present (and `true`) only when the iterative solver hit its cap
    pub const GRAPH_PROVISIONAL: &str = "graph_prediction_provisional";
    pub const LLM_PREDICTION: &str = "llm_based_prediction";
}

/// A person node in the relationship graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Properties associated with this node
    pub properties: PropertyMap,
}

impl Node {
    /// Create a new node without attributes
    pub fn new(id: NodeId) -> Self {
        Node {
            id,
            properties: PropertyMap::new(),
        }
    }

    /// Set a property value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Remove a property
    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.shift_remove(key)
    }

    /// Check if property exists
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn region(&self) -> Option<&str> {
        self.get_property(attr::REGION).and_then(|v| v.as_string())
    }

    /// Get number of properties
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_properties() {
        let mut node = Node::new(NodeId(4));

        node.set_property(attr::REGION, "Lagos");
        node.set_property(attr::LLM_PREDICTION, 105i64);

        assert_eq!(node.region(), Some("Lagos"));
        assert_eq!(node.get_property(attr::LLM_PREDICTION).unwrap().as_integer(), Some(105));
        assert_eq!(node.property_count(), 2);

        let removed = node.remove_property(attr::REGION);
        assert!(removed.is_some());
        assert_eq!(node.property_count(), 1);
        assert!(!node.has_property(attr::REGION));
        assert_eq!(node.region(), None);
    }

    #[test]
    fn test_set_property_returns_previous() {
        let mut node = Node::new(NodeId(1));
        assert!(node.set_property(attr::LABEL, "suspicious").is_none());
        let old = node.set_property(attr::LABEL, "not_suspicious");
        assert_eq!(old, Some(PropertyValue::from("suspicious")));
    }

    #[test]
    fn test_node_equality() {
        let mut node1 = Node::new(NodeId(7));
        node1.set_property(attr::REGION, "A");
        let node2 = Node::new(NodeId(7));
        let node3 = Node::new(NodeId(8));

        assert_eq!(node1, node2); // Same ID
        assert_ne!(node1, node3); // Different ID
    }
}

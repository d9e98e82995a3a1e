//! Edge implementation for the relationship graph
//!
//! Edges are undirected. `source`/`target` record the orientation of the
//! first connection that created the pair and only matter for export order.

use super::property::{PropertyMap, PropertyValue};
use super::types::{NodeId, PairKey};
use serde::{Deserialize, Serialize};

/// Well-known edge attribute names
pub mod attr {
    pub const LABEL: &str = "label";
    pub const UNIQUE_ID: &str = "unique_id";
    /// Every label seen for the pair (only with `EdgeMode::KeepAllLabels`)
    pub const LABELS: &str = "labels";
    /// Every connection id seen for the pair (only with `EdgeMode::KeepAllLabels`)
    pub const UNIQUE_IDS: &str = "unique_ids";
}

/// An undirected edge in the relationship graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// First endpoint
    pub source: NodeId,

    /// Second endpoint
    pub target: NodeId,

    /// Properties associated with this edge
    pub properties: PropertyMap,
}

impl Edge {
    /// Create a new edge
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Edge {
            source,
            target,
            properties: PropertyMap::new(),
        }
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(self.source, self.target)
    }

    /// Set a property value
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
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

    /// Get number of properties
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// The `label` attribute, if set
    pub fn label(&self) -> Option<&str> {
        self.get_property(attr::LABEL).and_then(|v| v.as_string())
    }

    /// The `unique_id` attribute, if set
    pub fn unique_id(&self) -> Option<i64> {
        self.get_property(attr::UNIQUE_ID).and_then(|v| v.as_integer())
    }

    /// Check if this edge connects two specific nodes (in either direction)
    pub fn connects(&self, node1: NodeId, node2: NodeId) -> bool {
        (self.source == node1 && self.target == node2)
            || (self.source == node2 && self.target == node1)
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_attributes() {
        let mut edge = Edge::new(NodeId(1), NodeId(2));
        edge.set_property(attr::LABEL, "follower");
        edge.set_property(attr::UNIQUE_ID, 77i64);

        assert_eq!(edge.label(), Some("follower"));
        assert_eq!(edge.unique_id(), Some(77));
        assert_eq!(edge.property_count(), 2);
    }

    #[test]
    fn test_edge_equality_ignores_orientation() {
        let a = Edge::new(NodeId(1), NodeId(2));
        let b = Edge::new(NodeId(2), NodeId(1));
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_edge_connects() {
        let edge = Edge::new(NodeId(10), NodeId(20));

        assert!(edge.connects(NodeId(10), NodeId(20)));
        assert!(edge.connects(NodeId(20), NodeId(10)));
        assert!(!edge.connects(NodeId(10), NodeId(30)));
        assert_eq!(edge.other(NodeId(20)), Some(NodeId(10)));
        assert_eq!(edge.other(NodeId(30)), None);
    }

    #[test]
    fn test_remove_property() {
        let mut edge = Edge::new(NodeId(1), NodeId(2));

        edge.set_property("temp", "value");
        assert!(edge.has_property("temp"));

        let removed = edge.remove_property("temp");
        assert!(removed.is_some());
        assert!(!edge.has_property("temp"));
        assert_eq!(edge.property_count(), 0);
    }

    #[test]
    fn test_self_loop() {
        assert!(Edge::new(NodeId(3), NodeId(3)).is_self_loop());
    }
}

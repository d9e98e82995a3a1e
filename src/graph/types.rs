//! Core type definitions for the relationship graph

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a node (the profile id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub i64);

impl NodeId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        NodeId(id)
    }
}

/// Semantic edge label derived from a connection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EdgeLabel {
    FriendWith,
    InSameGroup,
    Follower,
    CommentedOn,
    Tagged,
}

impl EdgeLabel {
    pub const ALL: [EdgeLabel; 5] = [
        EdgeLabel::FriendWith,
        EdgeLabel::InSameGroup,
        EdgeLabel::Follower,
        EdgeLabel::CommentedOn,
        EdgeLabel::Tagged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::FriendWith => "friend_with",
            EdgeLabel::InSameGroup => "in_same_group",
            EdgeLabel::Follower => "follower",
            EdgeLabel::CommentedOn => "commented_on",
            EdgeLabel::Tagged => "tagged",
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeLabel::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| format!("unknown edge label: {}", s))
    }
}

/// Unordered node pair keying an undirected edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct PairKey(NodeId, NodeId);

impl PairKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            PairKey(a, b)
        } else {
            PairKey(b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(format!("{}", id), "NodeId(42)");

        let id2: NodeId = 100.into();
        assert_eq!(id2.as_i64(), 100);
    }

    #[test]
    fn test_edge_label_names() {
        assert_eq!(EdgeLabel::FriendWith.as_str(), "friend_with");
        assert_eq!(EdgeLabel::InSameGroup.to_string(), "in_same_group");
        assert_eq!("tagged".parse::<EdgeLabel>(), Ok(EdgeLabel::Tagged));
        assert!("knows".parse::<EdgeLabel>().is_err());
    }

    #[test]
    fn test_pair_key_is_unordered() {
        let a = PairKey::new(NodeId(3), NodeId(1));
        let b = PairKey::new(NodeId(1), NodeId(3));
        assert_eq!(a, b);
        assert_eq!(a, PairKey(NodeId(1), NodeId(3)));
    }

    #[test]
    fn test_id_ordering() {
        assert!(NodeId(1) < NodeId(2));
    }
}

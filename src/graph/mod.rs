//! Relationship graph data model
//!
//! This module implements the person graph the pipeline builds and annotates:
//! - Person nodes keyed by profile id, with typed attributes
//! - Undirected edges with `label` / `unique_id` attributes
//! - One edge per unordered pair, last write wins on attributes

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStatistics, SocialGraph};
pub use types::{EdgeLabel, NodeId, PairKey};

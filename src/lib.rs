//! Wildnet
//!
//! Relationship-graph suspicion propagation for wildlife-trafficking
//! investigations. Profiles and their connections form an undirected person
//! graph; LLM suspicion scores on posts are summed per profile, thresholded
//! into seed labels and spread over the graph with harmonic-function label
//! propagation.
//!
//! # Stages
//!
//! - Relationship graph builder: typed edges from selected connection kinds
//! - Suspicion aggregator: per-profile sum of `traffic_likelihood`
//! - Seed labeler: `suspicious` / `not_suspicious` at fixed thresholds
//! - Label propagator: per-component harmonic solve (direct or iterative)
//! - Result exporter: prediction attributes, GraphML and a native snapshot
//!
//! ## Example Usage
//!
//! ```rust
//! use wildnet::data::{ActivityLink, Connection, ContentRecord, InMemorySource, Profile};
//! use wildnet::{NodeId, Pipeline, PipelineConfig, PipelineContext};
//!
//! let profiles = vec![
//!     Profile { id: 1, profile_type: "person".into(), region: Some("A".into()) },
//!     Profile { id: 2, profile_type: "person".into(), region: Some("B".into()) },
//! ];
//! let connections = vec![Connection {
//!     id: 10,
//!     source_id: 1,
//!     target_id: 2,
//!     connection_type: "FOLLOWED_THEM_ON_FACEBOOK".into(),
//! }];
//! let links = vec![ActivityLink { profile_id: Some(1), activity_id: 100 }];
//! let content = vec![ContentRecord {
//!     id: 100,
//!     traffic_likelihood: 120,
//!     species_being_mentioned: vec!["pangolin".into()],
//!     location: vec![],
//!     pii: vec![],
//!     actions: vec!["selling".into()],
//!     translated_content: None,
//!     language: None,
//! }];
//! let source = InMemorySource::with_records(profiles, connections, links, &content);
//!
//! let pipeline = Pipeline::new(PipelineContext::new(PipelineConfig::default()).unwrap());
//! let run = pipeline.execute(&source).unwrap();
//! let node = run.annotated.get_node(NodeId(2)).unwrap();
//! assert_eq!(
//!     node.get_property("graph_based_prediction").and_then(|v| v.as_string()),
//!     Some("suspicious")
//! );
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod data;
pub mod graph;
pub mod persistence;
pub mod pipeline;
pub mod report;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeLabel, GraphError, GraphResult, GraphStatistics, Node, NodeId, PropertyMap,
    PropertyValue, SocialGraph,
};

pub use config::{
    ConfigError, ConfigResult, EdgeMode, OutputPaths, PipelineConfig, PropagationConfig,
    PropagationScope, RelationshipSelection, SeedThresholds, Solver,
};

pub use data::{DataError, DataResult, DataSource, InMemorySource, InputPaths, JsonTableSource};

pub use persistence::{
    load_snapshot, read_graphml, save_snapshot, write_graphml, PersistenceError,
    PersistenceResult, SnapshotInfo,
};

pub use pipeline::{
    ExportedFiles, Pipeline, PipelineContext, PipelineError, PipelineResult, PipelineRun,
    PropagationOutcome, SeedLabel, SeedSets, SuspicionScores,
};

pub use report::{profile_summary, rank_profiles, PipelineReport, ProfileSummary, RankedProfile};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

//! Pipeline configuration
//!
//! Loaded from YAML; every section has defaults so a partial file (or no
//! file at all) is a valid configuration.

use crate::data::{ConnectionKind, InputPaths, Relationship};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub use wildnet_graph_algorithms::{HarmonicConfig as PropagationConfig, Solver};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed thresholds overlap, which would let a node be seeded twice
    #[error("invalid seed thresholds: not_suspicious_at_most ({not_suspicious_at_most}) must be below suspicious_at_least ({suspicious_at_least})")]
    InvalidThresholds {
        suspicious_at_least: i64,
        not_suspicious_at_most: i64,
    },

    #[error("invalid propagation settings: {0}")]
    InvalidPropagation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which relationship kinds become edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipSelection {
    pub friends: bool,
    pub groups: bool,
    pub follows: bool,
    pub comments: bool,
    pub tags: bool,
}

impl Default for RelationshipSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl RelationshipSelection {
    pub fn all() -> Self {
        Self {
            friends: true,
            groups: true,
            follows: true,
            comments: true,
            tags: true,
        }
    }

    pub fn none() -> Self {
        Self {
            friends: false,
            groups: false,
            follows: false,
            comments: false,
            tags: false,
        }
    }

    pub fn is_enabled(&self, relationship: Relationship) -> bool {
        match relationship {
            Relationship::Friends => self.friends,
            Relationship::Groups => self.groups,
            Relationship::Follows => self.follows,
            Relationship::Comments => self.comments,
            Relationship::Tags => self.tags,
        }
    }

    /// Enabled connection kinds, in staging order
    pub fn enabled_kinds(&self) -> Vec<ConnectionKind> {
        ConnectionKind::ALL
            .into_iter()
            .filter(|k| self.is_enabled(k.relationship()))
            .collect()
    }
}

/// How repeated connections between the same pair are recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Later connections overwrite `label` / `unique_id`
    #[default]
    LastWriteWins,
    /// As `LastWriteWins`, plus `labels` / `unique_ids` lists of every connection
    KeepAllLabels,
}

/// Which nodes label propagation runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationScope {
    /// The whole relationship graph
    Full,
    /// Profiles with enriched content plus their direct neighbors
    #[default]
    ContentNeighborhood,
}

/// Fixed score thresholds for seed labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedThresholds {
    /// Aggregated score at or above which a profile is seeded `suspicious`
    pub suspicious_at_least: i64,
    /// Aggregated score at or below which a profile is seeded `not_suspicious`
    pub not_suspicious_at_most: i64,
}

impl Default for SeedThresholds {
    fn default() -> Self {
        Self {
            suspicious_at_least: 100,
            not_suspicious_at_most: 1,
        }
    }
}

/// Output file locations. Optional outputs are skipped when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    /// Full relationship graph before scoping
    pub overall_graph: Option<PathBuf>,
    /// Scoped graph before predictions are attached
    pub scoped_graph: Option<PathBuf>,
    /// Annotated graph (GraphML)
    pub predictions: PathBuf,
    /// Annotated graph (native snapshot)
    pub snapshot: Option<PathBuf>,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            overall_graph: Some(PathBuf::from("overall_graph.graphml")),
            scoped_graph: Some(PathBuf::from("subgraph.graphml")),
            predictions: PathBuf::from("subgraph_with_predictions.graphml"),
            snapshot: Some(PathBuf::from("subgraph_with_predictions.snapshot")),
        }
    }
}

impl OutputPaths {
    /// Resolve relative paths against `base`
    pub fn relative_to(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| if p.is_absolute() { p.clone() } else { base.join(p) };
        Self {
            overall_graph: self.overall_graph.as_ref().map(join),
            scoped_graph: self.scoped_graph.as_ref().map(join),
            predictions: join(&self.predictions),
            snapshot: self.snapshot.as_ref().map(join),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub relationships: RelationshipSelection,
    pub only_connected_nodes: bool,
    pub edge_mode: EdgeMode,
    pub scope: PropagationScope,
    pub thresholds: SeedThresholds,
    pub propagation: PropagationConfig,
    pub input: InputPaths,
    pub output: OutputPaths,
}

impl PipelineConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file; relative input/output paths resolve against its directory
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if let Some(base) = path.parent() {
            config.input = config.input.relative_to(base);
            config.output = config.output.relative_to(base);
        }
        info!("Loaded pipeline config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let t = &self.thresholds;
        if t.not_suspicious_at_most >= t.suspicious_at_least {
            return Err(ConfigError::InvalidThresholds {
                suspicious_at_least: t.suspicious_at_least,
                not_suspicious_at_most: t.not_suspicious_at_most,
            });
        }
        let p = &self.propagation;
        if !(p.tolerance > 0.0) {
            return Err(ConfigError::InvalidPropagation(format!(
                "tolerance must be positive, got {}",
                p.tolerance
            )));
        }
        if p.solver != Solver::Direct && p.max_iterations == 0 {
            return Err(ConfigError::InvalidPropagation(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

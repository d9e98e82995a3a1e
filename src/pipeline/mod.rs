//! Suspicion propagation pipeline
//!
//! One synchronous pass: load, build, aggregate, seed, propagate, export.
//! Every input table is read before anything is written, so an I/O failure
//! leaves no partial output behind.

pub mod aggregate;
pub mod builder;
pub mod export;
pub mod propagate;
pub mod seed;

pub use aggregate::{aggregate_suspicion, SuspicionScores};
pub use builder::{build_person_graph, BuildOptions};
pub use export::{attach_predictions, NO_POST_DATA};
pub use propagate::{propagate_labels, NodePrediction, PropagationOutcome};
pub use seed::{apply_seeds, seed_labels, SeedLabel, SeedSets};

use crate::config::{ConfigError, PipelineConfig, PropagationScope};
use crate::data::{DataError, DataSource, ValidationError};
use crate::graph::{GraphError, NodeId, SocialGraph};
use crate::persistence::{self, PersistenceError, SnapshotInfo};
use crate::report::PipelineReport;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use wildnet_graph_algorithms::PropagationError;

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("propagation error: {0}")]
    Propagation(#[from] PropagationError),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Immutable settings shared by every stage of a run
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub config: PipelineConfig,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

/// Everything a run produced, before anything is written
#[derive(Debug)]
pub struct PipelineRun {
    /// Full relationship graph
    pub overall: SocialGraph,
    /// Propagation graph before predictions were attached
    pub scoped: SocialGraph,
    /// Propagation graph with seeds and predictions
    pub annotated: SocialGraph,
    pub scores: SuspicionScores,
    pub seeds: SeedSets,
    pub outcome: PropagationOutcome,
    /// Enrichment records rejected by validation
    pub rejected: Vec<ValidationError>,
}

/// Files written by [`Pipeline::export`]
#[derive(Debug, Clone, Default)]
pub struct ExportedFiles {
    pub overall_graph: Option<PathBuf>,
    pub scoped_graph: Option<PathBuf>,
    pub predictions: PathBuf,
    pub snapshot: Option<(PathBuf, SnapshotInfo)>,
}

/// Runs the stages in order over one context
#[derive(Debug, Clone)]
pub struct Pipeline {
    context: PipelineContext,
}

impl Pipeline {
    pub fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Load inputs and compute predictions without writing anything
    pub fn execute(&self, source: &dyn DataSource) -> PipelineResult<PipelineRun> {
        let config = &self.context.config;

        let profiles = source.profiles()?;
        let connections = source.connections()?;
        let links = source.activity_links()?;
        let content = source.content()?;
        info!(
            "Loaded {} profiles, {} connections, {} activity links, {} content records",
            profiles.len(),
            connections.len(),
            links.len(),
            content.records.len()
        );

        let overall = build_person_graph(&profiles, &connections, &BuildOptions::from(config))?;
        let scores = aggregate_suspicion(&content.records, &links);

        let scoped = match config.scope {
            PropagationScope::Full => overall.clone(),
            PropagationScope::ContentNeighborhood => {
                let sub = overall.content_neighborhood(scores.profile_ids().into_iter().map(NodeId));
                info!("Number of nodes in subgraph: {}", sub.node_count());
                info!("Number of edges in subgraph: {}", sub.edge_count());
                sub
            }
        };

        let seeds = seed_labels(&scores, &config.thresholds);
        let mut annotated = scoped.clone();
        apply_seeds(&mut annotated, &seeds);

        let outcome = propagate_labels(&annotated, &config.propagation)?;
        attach_predictions(&mut annotated, &outcome, &scores);

        Ok(PipelineRun {
            overall,
            scoped,
            annotated,
            scores,
            seeds,
            outcome,
            rejected: content.rejected,
        })
    }

    /// Write the configured outputs of a finished run
    pub fn export(&self, run: &PipelineRun) -> PipelineResult<ExportedFiles> {
        let output = &self.context.config.output;

        if let Some(path) = &output.overall_graph {
            persistence::write_graphml(&run.overall, path)?;
        }
        if let Some(path) = &output.scoped_graph {
            persistence::write_graphml(&run.scoped, path)?;
        }
        persistence::write_graphml(&run.annotated, &output.predictions)?;

        let snapshot = match &output.snapshot {
            Some(path) => Some((path.clone(), persistence::save_snapshot(&run.annotated, path)?)),
            None => None,
        };

        Ok(ExportedFiles {
            overall_graph: output.overall_graph.clone(),
            scoped_graph: output.scoped_graph.clone(),
            predictions: output.predictions.clone(),
            snapshot,
        })
    }

    /// Execute, export and summarize
    pub fn run(&self, source: &dyn DataSource) -> PipelineResult<PipelineReport> {
        let run = self.execute(source)?;
        let files = self.export(&run)?;
        let report = PipelineReport::new(&run, Some(&files));
        info!(
            "Pipeline finished: {} resolved, {} unresolved",
            report.resolved_nodes, report.unresolved_nodes
        );
        Ok(report)
    }
}

//! Reports over pipeline results

use crate::data::{ActivityLink, ContentRecord};
use crate::graph::{GraphStatistics, NodeId, SocialGraph};
use crate::pipeline::aggregate::link_index;
use crate::pipeline::{ExportedFiles, PipelineRun, SuspicionScores};
use indexmap::IndexSet;
use serde::Serialize;
use std::path::PathBuf;

/// One row of the suspicion ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedProfile {
    pub profile_id: i64,
    pub score: i64,
    /// Content records behind the score
    pub records: usize,
    pub region: Option<String>,
}

/// Profiles by aggregated suspicion, highest first (ties by id)
pub fn rank_profiles(scores: &SuspicionScores, graph: &SocialGraph, limit: usize) -> Vec<RankedProfile> {
    let mut ranked: Vec<(i64, i64)> = scores.iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(profile_id, score)| RankedProfile {
            profile_id,
            score,
            records: scores.record_count(profile_id),
            region: graph
                .get_node(NodeId(profile_id))
                .and_then(|n| n.region())
                .map(str::to_string),
        })
        .collect()
}

/// Extracted entities and total suspicion for one profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub profile_id: i64,
    pub total_suspicion: i64,
    pub records: usize,
    pub species: Vec<String>,
    pub locations: Vec<String>,
    pub pii: Vec<String>,
    pub actions: Vec<String>,
}

/// Summarize a profile's enrichment records.
///
/// Entity lists are de-duplicated keeping first-seen order.
pub fn profile_summary(profile_id: i64, content: &[ContentRecord], links: &[ActivityLink]) -> ProfileSummary {
    let owners = link_index(links);
    let mut species = IndexSet::new();
    let mut locations = IndexSet::new();
    let mut pii = IndexSet::new();
    let mut actions = IndexSet::new();
    let mut summary = ProfileSummary {
        profile_id,
        ..ProfileSummary::default()
    };

    let owned = content.iter().filter(|r| {
        owners
            .get(&r.id)
            .is_some_and(|profiles| profiles.contains(&profile_id))
    });
    for record in owned {
        summary.total_suspicion += record.traffic_likelihood;
        summary.records += 1;
        species.extend(record.species_being_mentioned.iter().cloned());
        locations.extend(record.location.iter().cloned());
        pii.extend(record.pii.iter().cloned());
        actions.extend(record.actions.iter().cloned());
    }

    summary.species = species.into_iter().collect();
    summary.locations = locations.into_iter().collect();
    summary.pii = pii.into_iter().collect();
    summary.actions = actions.into_iter().collect();
    summary
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub overall: GraphStatistics,
    pub propagation_graph: GraphStatistics,
    pub scored_profiles: usize,
    pub suspicious_seeds: usize,
    pub not_suspicious_seeds: usize,
    pub resolved_nodes: usize,
    pub unresolved_nodes: usize,
    /// Each unresolved component as a sorted id list
    pub unresolved_components: Vec<Vec<i64>>,
    /// Provisional nodes, including the unreached ones
    pub provisional_nodes: usize,
    /// Nodes a capped solve never reached, left without a prediction
    pub unreached_nodes: Vec<i64>,
    pub converged: bool,
    pub rejected_records: Vec<crate::data::ValidationError>,
    pub outputs: Vec<PathBuf>,
}

impl PipelineReport {
    pub fn new(run: &PipelineRun, files: Option<&ExportedFiles>) -> Self {
        let outputs = files
            .map(|f| {
                let mut paths: Vec<PathBuf> = Vec::new();
                paths.extend(f.overall_graph.clone());
                paths.extend(f.scoped_graph.clone());
                paths.push(f.predictions.clone());
                paths.extend(f.snapshot.as_ref().map(|(p, _)| p.clone()));
                paths
            })
            .unwrap_or_default();

        Self {
            overall: run.overall.statistics(),
            propagation_graph: run.annotated.statistics(),
            scored_profiles: run.scores.len(),
            suspicious_seeds: run.seeds.suspicious.len(),
            not_suspicious_seeds: run.seeds.not_suspicious.len(),
            resolved_nodes: run.outcome.predictions.len(),
            unresolved_nodes: run.outcome.unresolved_count(),
            unresolved_components: run
                .outcome
                .unresolved
                .iter()
                .map(|c| c.iter().map(|n| n.as_i64()).collect())
                .collect(),
            provisional_nodes: run.outcome.provisional_count(),
            unreached_nodes: run.outcome.unreached_provisional.iter().map(|n| n.as_i64()).collect(),
            converged: run.outcome.converged(),
            rejected_records: run.rejected.clone(),
            outputs,
        }
    }
}

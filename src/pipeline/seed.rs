//! Seed labels from aggregated suspicion

use super::aggregate::SuspicionScores;
use crate::config::SeedThresholds;
use crate::graph::node::attr;
use crate::graph::{NodeId, SocialGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// The two propagated classes. Declaration order is the class index order,
/// which also breaks ties during propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedLabel {
    Suspicious,
    NotSuspicious,
}

impl SeedLabel {
    pub const CLASSES: [SeedLabel; 2] = [SeedLabel::Suspicious, SeedLabel::NotSuspicious];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeedLabel::Suspicious => "suspicious",
            SeedLabel::NotSuspicious => "not_suspicious",
        }
    }

    pub fn class_index(&self) -> usize {
        match self {
            SeedLabel::Suspicious => 0,
            SeedLabel::NotSuspicious => 1,
        }
    }

    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::CLASSES.get(index).copied()
    }
}

impl fmt::Display for SeedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CLASSES
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| format!("unknown label: {s}"))
    }
}

/// Disjoint seed sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSets {
    pub suspicious: BTreeSet<i64>,
    pub not_suspicious: BTreeSet<i64>,
}

impl SeedSets {
    pub fn label_of(&self, profile: i64) -> Option<SeedLabel> {
        if self.suspicious.contains(&profile) {
            Some(SeedLabel::Suspicious)
        } else if self.not_suspicious.contains(&profile) {
            Some(SeedLabel::NotSuspicious)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.suspicious.len() + self.not_suspicious.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Threshold aggregated scores into seed sets.
///
/// Profiles absent from `scores` are never seeded. With valid thresholds
/// (`not_suspicious_at_most < suspicious_at_least`) the sets are disjoint;
/// should they overlap anyway, `suspicious` takes precedence.
pub fn seed_labels(scores: &SuspicionScores, thresholds: &SeedThresholds) -> SeedSets {
    let mut seeds = SeedSets::default();
    for (profile, score) in scores.iter() {
        if score >= thresholds.suspicious_at_least {
            seeds.suspicious.insert(profile);
        } else if score <= thresholds.not_suspicious_at_most {
            seeds.not_suspicious.insert(profile);
        }
    }
    info!(
        "Seeded {} suspicious and {} not_suspicious profiles",
        seeds.suspicious.len(),
        seeds.not_suspicious.len()
    );
    seeds
}

/// Write seed labels as the `label` node attribute.
///
/// Only nodes present in `graph` are labeled; returns how many were.
pub fn apply_seeds(graph: &mut SocialGraph, seeds: &SeedSets) -> usize {
    let mut applied = 0;
    let labeled = seeds
        .suspicious
        .iter()
        .map(|&p| (p, SeedLabel::Suspicious))
        .chain(seeds.not_suspicious.iter().map(|&p| (p, SeedLabel::NotSuspicious)));

    for (profile, label) in labeled {
        match graph.get_node_mut(NodeId(profile)) {
            Some(node) => {
                node.set_property(attr::LABEL, label.as_str());
                applied += 1;
            }
            None => debug!("Seed {} is not in the graph, skipping", profile),
        }
    }
    debug!("Applied {} of {} seed labels", applied, seeds.len());
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PropertyMap;

    #[test]
    fn test_thresholds() {
        let scores = SuspicionScores::from_totals([(1, 100), (2, 99), (3, 2), (4, 1), (5, 0), (6, 105)]);
        let seeds = seed_labels(&scores, &SeedThresholds::default());

        assert_eq!(seeds.suspicious, [1, 6].into_iter().collect());
        assert_eq!(seeds.not_suspicious, [4, 5].into_iter().collect());
        assert_eq!(seeds.label_of(2), None);
        assert_eq!(seeds.label_of(99), None);
    }

    #[test]
    fn test_apply_seeds_only_to_present_nodes() {
        let mut graph = SocialGraph::new();
        graph.add_node(NodeId(1), PropertyMap::new());
        graph.add_node(NodeId(2), PropertyMap::new());

        let seeds = SeedSets {
            suspicious: [1, 50].into_iter().collect(),
            not_suspicious: [2].into_iter().collect(),
        };
        assert_eq!(apply_seeds(&mut graph, &seeds), 2);
        assert!(!graph.has_node(NodeId(50)));
        assert_eq!(
            graph.get_node(NodeId(2)).unwrap().get_property(attr::LABEL).unwrap().as_string(),
            Some("not_suspicious")
        );
    }

    #[test]
    fn test_label_round_trip() {
        for label in SeedLabel::CLASSES {
            assert_eq!(label.as_str().parse::<SeedLabel>().unwrap(), label);
            assert_eq!(SeedLabel::from_class_index(label.class_index()), Some(label));
        }
        assert!("maybe".parse::<SeedLabel>().is_err());
    }
}

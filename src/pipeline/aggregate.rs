//! Per-profile suspicion aggregation
//!
//! Enrichment records are joined to profiles through the activity link table
//! (inner join on `activity_id = content.id`) and their `traffic_likelihood`
//! values are summed per profile. A profile without any joined record is
//! absent from the result, which is different from a score of zero.

use crate::data::{ActivityLink, ContentRecord};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Aggregated suspicion per profile id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuspicionScores {
    totals: FxHashMap<i64, i64>,
    record_counts: FxHashMap<i64, usize>,
    /// Records dropped because no link resolved them to a profile
    dropped: usize,
}

impl SuspicionScores {
    /// Build directly from `(profile_id, score)` totals.
    ///
    /// No content records stand behind these totals, so `record_count` is 0.
    pub fn from_totals(totals: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let mut scores = Self::default();
        for (profile, score) in totals {
            scores.add_total(profile, score);
        }
        scores
    }

    fn add_total(&mut self, profile: i64, score: i64) {
        let total = self.totals.entry(profile).or_insert(0);
        *total = total.saturating_add(score);
    }

    fn add_record(&mut self, profile: i64, score: i64) {
        self.add_total(profile, score);
        *self.record_counts.entry(profile).or_insert(0) += 1;
    }

    /// Total score, `None` when the profile has no content
    pub fn get(&self, profile: i64) -> Option<i64> {
        self.totals.get(&profile).copied()
    }

    pub fn contains(&self, profile: i64) -> bool {
        self.totals.contains_key(&profile)
    }

    /// Number of joined content records for a profile
    pub fn record_count(&self, profile: i64) -> usize {
        self.record_counts.get(&profile).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.totals.iter().map(|(&p, &s)| (p, s))
    }

    /// Profiles with at least one joined content record, sorted
    pub fn profile_ids(&self) -> BTreeSet<i64> {
        self.totals.keys().copied().collect()
    }
}

/// Index of activity id to owning profiles; unresolvable links are skipped
pub(crate) fn link_index(links: &[ActivityLink]) -> FxHashMap<i64, Vec<i64>> {
    let mut owners: FxHashMap<i64, Vec<i64>> = FxHashMap::default();
    for link in links {
        if let Some(profile) = link.profile_id {
            owners.entry(link.activity_id).or_default().push(profile);
        }
    }
    owners
}

/// Sum `traffic_likelihood` per owning profile.
///
/// An activity linked to several profiles counts once for each of them.
pub fn aggregate_suspicion(content: &[ContentRecord], links: &[ActivityLink]) -> SuspicionScores {
    let owners = link_index(links);
    let mut scores = SuspicionScores::default();

    for record in content {
        match owners.get(&record.id) {
            Some(profiles) => {
                for &profile in profiles {
                    scores.add_record(profile, record.traffic_likelihood);
                }
            }
            None => {
                debug!("Content {} has no owning profile, skipping", record.id);
                scores.dropped += 1;
            }
        }
    }

    info!(
        "Aggregated suspicion for {} profiles from {} content records ({} unlinked)",
        scores.len(),
        content.len(),
        scores.dropped
    );
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, score: i64) -> ContentRecord {
        ContentRecord {
            id,
            traffic_likelihood: score,
            species_being_mentioned: vec![],
            location: vec![],
            pii: vec![],
            actions: vec![],
            translated_content: None,
            language: None,
        }
    }

    fn link(profile: Option<i64>, activity: i64) -> ActivityLink {
        ActivityLink {
            profile_id: profile,
            activity_id: activity,
        }
    }

    #[test]
    fn test_sum_per_profile() {
        let content = vec![record(10, 40), record(11, 65), record(12, 3)];
        let links = vec![link(Some(5), 10), link(Some(5), 11), link(Some(6), 12)];

        let scores = aggregate_suspicion(&content, &links);
        assert_eq!(scores.get(5), Some(105));
        assert_eq!(scores.record_count(5), 2);
        assert_eq!(scores.get(6), Some(3));
        assert_eq!(scores.get(7), None);
    }

    #[test]
    fn test_unlinked_content_dropped() {
        let content = vec![record(10, 4), record(11, 5), record(12, 5)];
        let links = vec![link(Some(1), 10), link(None, 11)];

        let scores = aggregate_suspicion(&content, &links);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores.dropped(), 2);
    }

    #[test]
    fn test_absent_differs_from_zero() {
        let scores = aggregate_suspicion(&[record(1, 0)], &[link(Some(3), 1)]);
        assert_eq!(scores.get(3), Some(0));
        assert!(scores.contains(3));
        assert!(!scores.contains(4));
    }

    #[test]
    fn test_shared_activity_counts_for_each_owner() {
        let scores = aggregate_suspicion(&[record(1, 4)], &[link(Some(1), 1), link(Some(2), 1)]);
        assert_eq!(scores.get(1), Some(4));
        assert_eq!(scores.get(2), Some(4));
    }

    #[test]
    fn test_extreme_scores_saturate() {
        let content = vec![record(1, i64::MAX), record(2, 7), record(3, i64::MIN), record(4, -1)];
        let links = vec![link(Some(1), 1), link(Some(1), 2), link(Some(2), 3), link(Some(2), 4)];

        let scores = aggregate_suspicion(&content, &links);
        assert_eq!(scores.get(1), Some(i64::MAX));
        assert_eq!(scores.get(2), Some(i64::MIN));
        assert_eq!(scores.record_count(1), 2);
    }

    #[test]
    fn test_totals_carry_no_record_counts() {
        let scores = SuspicionScores::from_totals([(1, 40), (1, 65), (2, 3)]);
        assert_eq!(scores.get(1), Some(105));
        assert_eq!(scores.record_count(1), 0);
        assert_eq!(scores.record_count(2), 0);
        assert!(scores.contains(2));
    }
}

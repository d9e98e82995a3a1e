use proptest::prelude::*;
use wildnet::data::{ActivityLink, Connection, ConnectionKind, ContentRecord};
use wildnet::pipeline::{aggregate_suspicion, build_person_graph, seed_labels, BuildOptions, SuspicionScores};
use wildnet::{NodeId, SeedThresholds};

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

fn rows() -> impl Strategy<Value = Vec<(i64, Option<i64>, i64)>> {
    // (activity id, owning profile, score)
    prop::collection::vec((0i64..40, prop::option::of(0i64..8), 1i64..=5), 0..60)
}

fn split(rows: &[(i64, Option<i64>, i64)]) -> (Vec<ContentRecord>, Vec<ActivityLink>) {
    let content = rows.iter().map(|&(activity, _, score)| record(activity, score)).collect();
    let mut links: Vec<ActivityLink> = rows
        .iter()
        .map(|&(activity, profile, _)| ActivityLink {
            profile_id: profile,
            activity_id: activity,
        })
        .collect();
    links.sort_by_key(|l| l.activity_id);
    links.dedup_by_key(|l| l.activity_id);
    (content, links)
}

fn sorted(scores: &SuspicionScores) -> Vec<(i64, i64)> {
    let mut v: Vec<(i64, i64)> = scores.iter().collect();
    v.sort_unstable();
    v
}

proptest! {
    #[test]
    fn aggregation_ignores_row_order(rows in rows(), seed in any::<u64>()) {
        let (content, links) = split(&rows);

        let mut shuffled_content = content.clone();
        let mut shuffled_links = links.clone();
        let mid = (seed as usize) % shuffled_content.len().max(1);
        let len = shuffled_content.len();
        shuffled_content.rotate_left(mid.min(len));
        shuffled_content.reverse();
        shuffled_links.reverse();

        let a = aggregate_suspicion(&content, &links);
        let b = aggregate_suspicion(&shuffled_content, &shuffled_links);
        prop_assert_eq!(sorted(&a), sorted(&b));
    }

    #[test]
    fn seed_sets_are_disjoint(
        totals in prop::collection::vec((0i64..50, -10i64..200), 0..80),
        suspicious_at_least in 2i64..150,
        gap in 1i64..50,
    ) {
        let thresholds = SeedThresholds {
            suspicious_at_least,
            not_suspicious_at_most: suspicious_at_least - gap,
        };
        let scores = SuspicionScores::from_totals(totals);
        let seeds = seed_labels(&scores, &thresholds);

        prop_assert!(seeds.suspicious.is_disjoint(&seeds.not_suspicious));
        for (profile, score) in scores.iter() {
            prop_assert_eq!(seeds.suspicious.contains(&profile), score >= suspicious_at_least);
            prop_assert_eq!(seeds.not_suspicious.contains(&profile), score <= thresholds.not_suspicious_at_most);
        }
    }

    #[test]
    fn edges_follow_last_staged_connection(
        pairs in prop::collection::vec((0i64..6, 0i64..6, 0usize..6), 1..40),
    ) {
        let connections: Vec<Connection> = pairs
            .iter()
            .enumerate()
            .map(|(i, &(s, t, k))| Connection {
                id: i as i64,
                source_id: s,
                target_id: t,
                connection_type: ConnectionKind::ALL[k].connection_type().to_string(),
            })
            .collect();
        let graph = build_person_graph(&[], &connections, &BuildOptions::default()).unwrap();

        for edge in graph.edges() {
            // expected winner: last connection of the pair in staging order
            let winner = ConnectionKind::ALL
                .iter()
                .flat_map(|kind| {
                    connections.iter().filter(move |c| c.kind() == Some(*kind))
                })
                .filter(|c| edge.connects(NodeId(c.source_id), NodeId(c.target_id)))
                .last()
                .unwrap();
            prop_assert_eq!(edge.unique_id(), Some(winner.id));
        }
        let endpoints = graph.connected_nodes();
        prop_assert_eq!(endpoints.len(), graph.node_count());
    }
}

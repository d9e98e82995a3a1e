use serde_json::json;
use std::collections::HashSet;
use wildnet::data::{ActivityLink, Connection, ConnectionKind, InMemorySource, Profile};
use wildnet::graph::node::attr;
use wildnet::pipeline::{build_person_graph, BuildOptions, NO_POST_DATA};
use wildnet::{
    DataError, InputPaths, JsonTableSource, NodeId, OutputPaths, Pipeline, PipelineConfig,
    PipelineContext, PipelineError, PropagationScope, PropertyValue, RelationshipSelection,
};

fn person(id: i64, region: &str) -> Profile {
    Profile {
        id,
        profile_type: "person".to_string(),
        region: Some(region.to_string()),
    }
}

fn conn(id: i64, source: i64, target: i64, connection_type: &str) -> Connection {
    Connection {
        id,
        source_id: source,
        target_id: target,
        connection_type: connection_type.to_string(),
    }
}

fn content(id: i64, score: i64) -> serde_json::Value {
    json!({
        "id": id,
        "traffic_likelihood": score,
        "species_being_mentioned": ["pangolin"],
        "location": [],
        "pii": [],
        "actions": ["selling"],
    })
}

/// Chain 7-5-1-2-3-6, a separate pair 9-10, isolated 4 and 8.
/// Profile 5 scores 40 + 65, profile 6 scores 1, profile 2 scores 20.
fn fixture() -> InMemorySource {
    let mut profiles: Vec<Profile> = (1..=10).map(|id| person(id, if id % 2 == 0 { "B" } else { "A" })).collect();
    profiles.push(Profile {
        id: 11,
        profile_type: "page".to_string(),
        region: None,
    });

    let connections = vec![
        conn(1, 1, 2, "FOLLOWED_THEM_ON_FACEBOOK"),
        conn(2, 2, 3, "BECAME_MEMBER_OF_GROUP_ON_FACEBOOK"),
        conn(3, 5, 1, "ADDED_THEM_AS_A_FRIEND_ON_FACEBOOK"),
        conn(4, 7, 5, "COMMENTED_ON_THEIR_POST_ON_FACEBOOK"),
        conn(5, 9, 10, "MENTIONED_THEM_ON_FACEBOOK"),
        conn(6, 3, 6, "updated-friends-list-on-facebook"),
        conn(7, 1, 3, "LIKED_THEIR_POST_ON_FACEBOOK"),
    ];

    let links = vec![
        ActivityLink { profile_id: Some(5), activity_id: 100 },
        ActivityLink { profile_id: Some(5), activity_id: 101 },
        ActivityLink { profile_id: Some(6), activity_id: 102 },
        ActivityLink { profile_id: None, activity_id: 103 },
        ActivityLink { profile_id: Some(2), activity_id: 104 },
    ];

    let records = vec![
        content(100, 40),
        content(101, 65),
        content(102, 1),
        content(103, 5),
        content(104, 20),
    ];

    InMemorySource::new(profiles, connections, links, records)
}

fn pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::new(PipelineContext::new(config).unwrap())
}

fn prediction(graph: &wildnet::SocialGraph, id: i64) -> Option<String> {
    graph
        .get_node(NodeId(id))
        .and_then(|n| n.get_property(attr::GRAPH_PREDICTION))
        .and_then(|v| v.as_string())
        .map(str::to_string)
}

#[test]
fn test_follows_and_groups_scenario() {
    let profiles = vec![person(1, "A"), person(2, "B"), person(3, "A")];
    let connections = vec![
        conn(1, 1, 2, "FOLLOWED_THEM_ON_FACEBOOK"),
        conn(2, 2, 3, "BECAME_MEMBER_OF_GROUP_ON_FACEBOOK"),
    ];
    let options = BuildOptions {
        relationships: RelationshipSelection {
            follows: true,
            groups: true,
            ..RelationshipSelection::none()
        },
        ..BuildOptions::default()
    };

    let graph = build_person_graph(&profiles, &connections, &options).unwrap();
    assert_eq!(graph.get_edge(NodeId(1), NodeId(2)).unwrap().label(), Some("follower"));
    assert_eq!(graph.get_edge(NodeId(2), NodeId(3)).unwrap().label(), Some("in_same_group"));
    assert!(!graph.has_edge(NodeId(1), NodeId(3)));
    assert_eq!(graph.get_node(NodeId(3)).unwrap().region(), Some("A"));
}

#[test]
fn test_single_kind_edges_carry_its_label() {
    let profiles: Vec<Profile> = (1..=4).map(|id| person(id, "A")).collect();
    for kind in ConnectionKind::ALL {
        let connections: Vec<Connection> = ConnectionKind::ALL
            .iter()
            .enumerate()
            .map(|(i, k)| conn(i as i64, 1 + (i as i64 % 3), 4, k.connection_type()))
            .chain([conn(99, 1, 2, kind.connection_type())])
            .collect();

        let mut relationships = RelationshipSelection::none();
        match kind.relationship() {
            wildnet::data::Relationship::Friends => relationships.friends = true,
            wildnet::data::Relationship::Groups => relationships.groups = true,
            wildnet::data::Relationship::Follows => relationships.follows = true,
            wildnet::data::Relationship::Comments => relationships.comments = true,
            wildnet::data::Relationship::Tags => relationships.tags = true,
        }
        let options = BuildOptions {
            relationships,
            ..BuildOptions::default()
        };

        let graph = build_person_graph(&profiles, &connections, &options).unwrap();
        assert!(graph.edge_count() > 0);
        for edge in graph.edges() {
            assert_eq!(edge.label(), Some(kind.edge_label().as_str()));
        }
    }
}

#[test]
fn test_no_kinds_enabled_yields_no_edges() {
    let config = PipelineConfig {
        relationships: RelationshipSelection::none(),
        scope: PropagationScope::Full,
        ..PipelineConfig::default()
    };
    let run = pipeline(config).execute(&fixture()).unwrap();
    assert_eq!(run.overall.node_count(), 10);
    assert_eq!(run.overall.edge_count(), 0);
}

#[test]
fn test_only_connected_nodes_equals_edge_endpoints() {
    let config = PipelineConfig {
        only_connected_nodes: true,
        ..PipelineConfig::default()
    };
    let run = pipeline(config).execute(&fixture()).unwrap();

    let nodes: HashSet<NodeId> = run.overall.node_ids().collect();
    let endpoints: HashSet<NodeId> = run.overall.edges().flat_map(|e| [e.source, e.target]).collect();
    assert_eq!(nodes, endpoints);
    assert!(!nodes.contains(&NodeId(4)));
    assert!(!nodes.contains(&NodeId(8)));
}

#[test]
fn test_full_scope_predictions() {
    let config = PipelineConfig {
        scope: PropagationScope::Full,
        ..PipelineConfig::default()
    };
    let run = pipeline(config).execute(&fixture()).unwrap();
    let graph = &run.annotated;

    // 40 + 65 = 105 seeds suspicious, 1 seeds not_suspicious, 20 stays unlabeled
    assert_eq!(run.scores.get(5), Some(105));
    assert!(run.seeds.suspicious.contains(&5));
    assert!(run.seeds.not_suspicious.contains(&6));
    assert_eq!(run.seeds.label_of(2), None);
    assert_eq!(
        graph.get_node(NodeId(5)).unwrap().get_property(attr::LABEL).and_then(|v| v.as_string()),
        Some("suspicious")
    );

    assert_eq!(prediction(graph, 5).as_deref(), Some("suspicious"));
    assert_eq!(prediction(graph, 7).as_deref(), Some("suspicious"));
    assert_eq!(prediction(graph, 1).as_deref(), Some("suspicious"));
    assert_eq!(prediction(graph, 3).as_deref(), Some("not_suspicious"));
    assert_eq!(prediction(graph, 6).as_deref(), Some("not_suspicious"));

    // {9, 10} has no seed: reported, left without prediction, export unaffected
    assert!(run.outcome.unresolved.contains(&vec![NodeId(9), NodeId(10)]));
    assert_eq!(prediction(graph, 9), None);
    assert_eq!(prediction(graph, 10), None);

    let llm = |id: i64| graph.get_node(NodeId(id)).unwrap().get_property(attr::LLM_PREDICTION).cloned();
    assert_eq!(llm(5), Some(PropertyValue::Integer(105)));
    assert_eq!(llm(2), Some(PropertyValue::Integer(20)));
    assert_eq!(llm(7), Some(PropertyValue::String(NO_POST_DATA.to_string())));
    assert_eq!(llm(9), Some(PropertyValue::String(NO_POST_DATA.to_string())));
}

#[test]
fn test_iteration_cap_reports_nodes_without_prediction() {
    let profiles: Vec<Profile> = (0..50).map(|id| person(id, "A")).collect();
    let connections: Vec<Connection> = (0..49)
        .map(|i| conn(i, i, i + 1, "FOLLOWED_THEM_ON_FACEBOOK"))
        .collect();
    let links = vec![
        ActivityLink { profile_id: Some(0), activity_id: 500 },
        ActivityLink { profile_id: Some(49), activity_id: 501 },
    ];
    let source = InMemorySource::new(profiles, connections, links, vec![content(500, 150), content(501, 1)]);

    let mut config = PipelineConfig {
        scope: PropagationScope::Full,
        ..PipelineConfig::default()
    };
    config.propagation.solver = wildnet::Solver::Iterative;
    config.propagation.max_iterations = 3;

    let run = pipeline(config).execute(&source).unwrap();
    let report = wildnet::PipelineReport::new(&run, None);

    assert!(!report.converged);
    assert_eq!(report.resolved_nodes, 8);
    assert_eq!(report.unreached_nodes, (4..=45).collect::<Vec<i64>>());
    assert_eq!(report.provisional_nodes, 48);
    assert_eq!(report.unresolved_nodes, 0);

    let middle = run.annotated.get_node(NodeId(25)).unwrap();
    assert!(!middle.has_property(attr::GRAPH_PREDICTION));
    assert_eq!(middle.get_property(attr::GRAPH_PROVISIONAL), Some(&PropertyValue::Boolean(true)));
}

#[test]
fn test_content_neighborhood_scope() {
    let run = pipeline(PipelineConfig::default()).execute(&fixture()).unwrap();

    let mut ids: Vec<i64> = run.annotated.node_ids().map(|n| n.as_i64()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 5, 6, 7]);
    assert_eq!(run.overall.node_count(), 10);
    assert!(run.outcome.unresolved.is_empty());
    assert!(run.outcome.converged());
    // scoped graph carries no predictions
    assert!(run.scoped.nodes().all(|n| !n.has_property(attr::GRAPH_PREDICTION)));
}

#[test]
fn test_rejected_content_does_not_stop_the_run() {
    let mut source = fixture();
    source.content.push(json!({"id": 105, "traffic_likelihood": 5}));
    source.content.push(json!("not a record"));

    let run = pipeline(PipelineConfig::default()).execute(&source).unwrap();
    assert_eq!(run.rejected.len(), 2);
    assert_eq!(run.rejected[0].index, 5);
    assert_eq!(run.scores.get(5), Some(105));
}

#[test]
fn test_run_writes_outputs_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        scope: PropagationScope::Full,
        output: OutputPaths::default().relative_to(dir.path()),
        ..PipelineConfig::default()
    };

    let report = pipeline(config.clone()).run(&fixture()).unwrap();
    assert_eq!(report.suspicious_seeds, 1);
    assert_eq!(report.not_suspicious_seeds, 1);
    assert_eq!(report.overall.node_count, 10);
    assert!(report.unresolved_components.contains(&vec![9, 10]));
    assert_eq!(report.outputs.len(), 4);
    for path in &report.outputs {
        assert!(path.exists(), "{path:?} missing");
    }

    let exported = wildnet::read_graphml(&config.output.predictions).unwrap();
    assert_eq!(prediction(&exported, 7).as_deref(), Some("suspicious"));
    assert_eq!(prediction(&exported, 9), None);
    assert_eq!(
        exported.get_node(NodeId(7)).unwrap().get_property(attr::LLM_PREDICTION),
        Some(&PropertyValue::String(NO_POST_DATA.to_string()))
    );

    let snapshot_path = config.output.snapshot.unwrap();
    let (snapshot, info) = wildnet::load_snapshot(&snapshot_path).unwrap();
    assert_eq!(info.node_count, 10);
    assert_eq!(snapshot.node_count(), exported.node_count());
}

#[test]
fn test_missing_input_is_fatal_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        input: InputPaths::default().relative_to(dir.path()),
        output: OutputPaths::default().relative_to(dir.path()),
        ..PipelineConfig::default()
    };
    let source = JsonTableSource::new(config.input.clone());

    let err = pipeline(config.clone()).run(&source).unwrap_err();
    assert!(matches!(err, PipelineError::Data(DataError::MissingTable(_))));
    assert!(!config.output.predictions.exists());
    assert!(!config.output.overall_graph.unwrap().exists());
}

#[test]
fn test_json_table_source_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("profiles.jsonl"),
        "{\"id\": 1, \"profile_type\": \"person\", \"region\": \"A\"}\n{\"id\": 2, \"profile_type\": \"person\"}\n",
    )
    .unwrap();
    std::fs::write(
        data.join("profile_connections.jsonl"),
        "{\"id\": 1, \"source_id\": 1, \"target_id\": 2, \"connection_type\": \"FOLLOWED_THEM_ON_FACEBOOK\"}\n",
    )
    .unwrap();
    std::fs::write(data.join("profile_activity.jsonl"), "{\"profile_id\": \"1\", \"activity_id\": 7}\n").unwrap();
    std::fs::write(data.join("translated_posts.jsonl"), format!("{}\n", content(7, 150))).unwrap();

    let config = PipelineConfig {
        input: InputPaths::default().relative_to(dir.path()),
        output: OutputPaths::default().relative_to(dir.path()),
        ..PipelineConfig::default()
    };
    let source = JsonTableSource::new(config.input.clone());
    let report = pipeline(config).run(&source).unwrap();

    assert_eq!(report.resolved_nodes, 2);
    assert_eq!(report.unresolved_nodes, 0);
    let exported = wildnet::read_graphml(dir.path().join("subgraph_with_predictions.graphml")).unwrap();
    assert_eq!(prediction(&exported, 2).as_deref(), Some("suspicious"));
    assert_eq!(exported.get_node(NodeId(2)).unwrap().region(), None);
}

//! Relationship graph builder

use crate::config::{EdgeMode, PipelineConfig, RelationshipSelection};
use crate::data::{Connection, ConnectionKind, Profile};
use crate::graph::edge::attr as edge_attr;
use crate::graph::node::attr;
use crate::graph::{GraphResult, NodeId, PropertyMap, PropertyValue, SocialGraph};
use tracing::{debug, info};

/// Options controlling graph construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    pub relationships: RelationshipSelection,
    /// Drop person nodes that are not an endpoint of any edge
    pub only_connected_nodes: bool,
    pub edge_mode: EdgeMode,
}

impl From<&PipelineConfig> for BuildOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            relationships: config.relationships,
            only_connected_nodes: config.only_connected_nodes,
            edge_mode: config.edge_mode,
        }
    }
}

/// A connection staged for insertion
struct StagedEdge {
    source: NodeId,
    target: NodeId,
    label: &'static str,
    unique_id: i64,
}

/// Build the undirected person graph.
///
/// Person profiles become nodes carrying `region`. Connections of each
/// enabled kind are staged in a fixed kind order and then inserted in that
/// order, so for a pair seen more than once the last staged connection's
/// `label` / `unique_id` survive. Endpoints without a person profile are
/// created without attributes.
pub fn build_person_graph(
    profiles: &[Profile],
    connections: &[Connection],
    options: &BuildOptions,
) -> GraphResult<SocialGraph> {
    let mut graph = SocialGraph::new();

    for profile in profiles.iter().filter(|p| p.is_person()) {
        let id = NodeId(profile.id);
        if graph.has_node(id) {
            debug!("Duplicate profile {}, keeping first occurrence", profile.id);
            continue;
        }
        let mut properties = PropertyMap::new();
        if let Some(region) = &profile.region {
            properties.insert(attr::REGION.to_string(), PropertyValue::String(region.clone()));
        }
        graph.add_node(id, properties);
    }
    info!("Added {} person nodes", graph.node_count());

    let mut staged = Vec::new();
    for kind in options.relationships.enabled_kinds() {
        let before = staged.len();
        staged.extend(stage_connections(connections, kind));
        info!(
            "Adding {} {} connections",
            staged.len() - before,
            kind.connection_type()
        );
    }

    for edge in &staged {
        let mut properties = PropertyMap::new();
        properties.insert(edge_attr::LABEL.to_string(), edge.label.into());
        properties.insert(edge_attr::UNIQUE_ID.to_string(), edge.unique_id.into());
        graph.add_edge(edge.source, edge.target, properties);

        if options.edge_mode == EdgeMode::KeepAllLabels {
            graph.record_edge_history(edge.source, edge.target, edge.label, edge.unique_id)?;
        }
    }

    if options.only_connected_nodes {
        let connected = graph.connected_nodes();
        graph = graph.induced_subgraph(&connected);
        info!("Number of connected nodes: {}", graph.node_count());
    }

    let stats = graph.statistics();
    info!(
        "Built graph with {} nodes and {} edges ({} isolated)",
        stats.node_count, stats.edge_count, stats.isolated_nodes
    );
    Ok(graph)
}

fn stage_connections(connections: &[Connection], kind: ConnectionKind) -> impl Iterator<Item = StagedEdge> + '_ {
    let label = kind.edge_label().as_str();
    connections
        .iter()
        .filter(move |c| c.kind() == Some(kind))
        .map(move |c| StagedEdge {
            source: NodeId(c.source_id),
            target: NodeId(c.target_id),
            label,
            unique_id: c.id,
        })
}

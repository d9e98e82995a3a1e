//! Wildnet CLI: runs the suspicion propagation pipeline and prints reports

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wildnet::data::{DataSource, JsonTableSource};
use wildnet::graph::node::attr;
use wildnet::pipeline::{aggregate_suspicion, build_person_graph, BuildOptions};
use wildnet::{
    load_snapshot, profile_summary, rank_profiles, read_graphml, GraphStatistics, Pipeline,
    PipelineConfig, PipelineContext, PipelineReport, PropagationScope, SocialGraph,
};

#[derive(Parser)]
#[command(name = "wildnet", version, about = "Relationship-graph suspicion propagation")]
struct Cli {
    /// Pipeline config (YAML); defaults apply when omitted
    #[arg(long, global = true, env = "WILDNET_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ScopeArg {
    Full,
    ContentNeighborhood,
}

#[derive(clap::Args, Default)]
struct Overrides {
    /// Drop person nodes without any edge
    #[arg(long)]
    only_connected: bool,

    /// Nodes propagation runs over
    #[arg(long)]
    scope: Option<ScopeArg>,

    #[arg(long)]
    no_friends: bool,
    #[arg(long)]
    no_groups: bool,
    #[arg(long)]
    no_follows: bool,
    #[arg(long)]
    no_comments: bool,
    #[arg(long)]
    no_tags: bool,
}

impl Overrides {
    fn apply(&self, config: &mut PipelineConfig) {
        if self.only_connected {
            config.only_connected_nodes = true;
        }
        match self.scope {
            Some(ScopeArg::Full) => config.scope = PropagationScope::Full,
            Some(ScopeArg::ContentNeighborhood) => config.scope = PropagationScope::ContentNeighborhood,
            None => {}
        }
        let r = &mut config.relationships;
        r.friends &= !self.no_friends;
        r.groups &= !self.no_groups;
        r.follows &= !self.no_follows;
        r.comments &= !self.no_comments;
        r.tags &= !self.no_tags;
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write its outputs
    Run {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// List profiles by aggregated suspicion
    Rank {
        /// Number of profiles to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show a profile's extracted entities and total suspicion
    Profile {
        /// Profile id
        id: i64,
    },
    /// Summarize a GraphML file or snapshot
    Inspect {
        /// `.graphml` file or snapshot
        path: PathBuf,

        /// Number of nodes to list
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Run { overrides } => run_pipeline(&cli, overrides),
        Commands::Rank { limit } => run_rank(&cli, *limit),
        Commands::Profile { id } => run_profile(&cli, *id),
        Commands::Inspect { path, limit } => run_inspect(path, *limit, &cli.format),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    match &cli.config {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn run_pipeline(cli: &Cli, overrides: &Overrides) -> Result<()> {
    let mut config = load_config(cli)?;
    overrides.apply(&mut config);

    let source = JsonTableSource::new(config.input.clone());
    let pipeline = Pipeline::new(PipelineContext::new(config)?);
    let report = pipeline.run(&source)?;

    print_report(&report, &cli.format)
}

fn run_rank(cli: &Cli, limit: usize) -> Result<()> {
    let config = load_config(cli)?;
    let source = JsonTableSource::new(config.input.clone());

    let graph = build_person_graph(&source.profiles()?, &source.connections()?, &BuildOptions::from(&config))?;
    let scores = aggregate_suspicion(&source.content()?.records, &source.activity_links()?);
    let ranked = rank_profiles(&scores, &graph, limit);

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ranked)?),
        OutputFormat::Csv => {
            println!("profile_id,traffic_likelihood,records,region");
            for r in &ranked {
                println!(
                    "{},{},{},{}",
                    r.profile_id,
                    r.score,
                    r.records,
                    csv_field(r.region.as_deref().unwrap_or(""))
                );
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(&["Profile", "Suspicion", "Records", "Region"]);
            for r in &ranked {
                table.add_row(vec![
                    r.profile_id.to_string(),
                    r.score.to_string(),
                    r.records.to_string(),
                    r.region.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{}", table);
            println!("{} profile(s)", ranked.len());
        }
    }
    Ok(())
}

fn run_profile(cli: &Cli, id: i64) -> Result<()> {
    let config = load_config(cli)?;
    let source = JsonTableSource::new(config.input.clone());
    let summary = profile_summary(id, &source.content()?.records, &source.activity_links()?);
    if summary.records == 0 {
        bail!("profile {} has no enriched content", id);
    }

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Csv => {
            println!("field,value");
            println!("total_suspicion,{}", summary.total_suspicion);
            println!("records,{}", summary.records);
            for (field, values) in summary_lists(&summary) {
                println!("{},{}", field, csv_field(&values.join("; ")));
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(&["Field", "Value"]);
            table.add_row(vec!["profile".to_string(), summary.profile_id.to_string()]);
            table.add_row(vec!["total suspicion".to_string(), summary.total_suspicion.to_string()]);
            table.add_row(vec!["records".to_string(), summary.records.to_string()]);
            for (field, values) in summary_lists(&summary) {
                table.add_row(vec![field.to_string(), values.join(", ")]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

fn summary_lists(summary: &wildnet::ProfileSummary) -> [(&'static str, &[String]); 4] {
    [
        ("species", summary.species.as_slice()),
        ("locations", summary.locations.as_slice()),
        ("pii", summary.pii.as_slice()),
        ("actions", summary.actions.as_slice()),
    ]
}

#[derive(Serialize)]
struct NodeRow {
    id: i64,
    region: Option<String>,
    label: Option<String>,
    graph_based_prediction: Option<String>,
    llm_based_prediction: Option<String>,
}

#[derive(Serialize)]
struct Inspection {
    statistics: GraphStatistics,
    nodes: Vec<NodeRow>,
}

fn load_graph(path: &Path) -> Result<SocialGraph> {
    let is_graphml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("graphml") || e.eq_ignore_ascii_case("xml"));
    let graph = if is_graphml {
        read_graphml(path)?
    } else {
        let (graph, info) = load_snapshot(path)?;
        info!("Snapshot created at {}", info.created_at);
        graph
    };
    Ok(graph)
}

fn run_inspect(path: &Path, limit: usize, format: &OutputFormat) -> Result<()> {
    let graph = load_graph(path).with_context(|| format!("reading {}", path.display()))?;
    let text = |node: &wildnet::Node, key: &str| node.get_property(key).map(|v| v.to_string());
    let nodes: Vec<NodeRow> = graph
        .nodes()
        .take(limit)
        .map(|n| NodeRow {
            id: n.id.as_i64(),
            region: n.region().map(str::to_string),
            label: text(n, attr::LABEL),
            graph_based_prediction: text(n, attr::GRAPH_PREDICTION),
            llm_based_prediction: text(n, attr::LLM_PREDICTION),
        })
        .collect();
    let inspection = Inspection {
        statistics: graph.statistics(),
        nodes,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inspection)?),
        OutputFormat::Csv => {
            println!("id,region,label,graph_based_prediction,llm_based_prediction");
            for row in &inspection.nodes {
                let cells = [&row.region, &row.label, &row.graph_based_prediction, &row.llm_based_prediction]
                    .map(|c| csv_field(c.as_deref().unwrap_or("")));
                println!("{},{}", row.id, cells.join(","));
            }
        }
        OutputFormat::Table => {
            print_statistics(&inspection.statistics);
            let mut table = new_table(&["Node", "Region", "Seed", "Graph prediction", "LLM prediction"]);
            let dash = |c: &Option<String>| c.clone().unwrap_or_else(|| "-".to_string());
            for row in &inspection.nodes {
                table.add_row(vec![
                    row.id.to_string(),
                    dash(&row.region),
                    dash(&row.label),
                    dash(&row.graph_based_prediction),
                    dash(&row.llm_based_prediction),
                ]);
            }
            println!("{}", table);
            println!("{} of {} node(s)", inspection.nodes.len(), inspection.statistics.node_count);
        }
    }
    Ok(())
}

fn print_report(report: &PipelineReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => {
            println!("metric,value");
            for (metric, value) in report_rows(report) {
                println!("{},{}", metric, csv_field(&value));
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(&["Metric", "Value"]);
            for (metric, value) in report_rows(report) {
                table.add_row(vec![metric.to_string(), value]);
            }
            println!("{}", table);

            if !report.unresolved_components.is_empty() {
                let mut table = new_table(&["Unresolved component", "Nodes"]);
                for (i, nodes) in report.unresolved_components.iter().enumerate() {
                    let ids: Vec<String> = nodes.iter().map(i64::to_string).collect();
                    table.add_row(vec![(i + 1).to_string(), ids.join(", ")]);
                }
                println!("{}", table);
            }
            for rejected in &report.rejected_records {
                println!("rejected: {}", rejected);
            }
        }
    }
    Ok(())
}

fn report_rows(report: &PipelineReport) -> Vec<(&'static str, String)> {
    let outputs: Vec<String> = report.outputs.iter().map(|p| p.display().to_string()).collect();
    vec![
        ("overall nodes", report.overall.node_count.to_string()),
        ("overall edges", report.overall.edge_count.to_string()),
        ("propagation nodes", report.propagation_graph.node_count.to_string()),
        ("propagation edges", report.propagation_graph.edge_count.to_string()),
        ("scored profiles", report.scored_profiles.to_string()),
        ("suspicious seeds", report.suspicious_seeds.to_string()),
        ("not_suspicious seeds", report.not_suspicious_seeds.to_string()),
        ("resolved nodes", report.resolved_nodes.to_string()),
        ("unresolved nodes", report.unresolved_nodes.to_string()),
        ("provisional nodes", report.provisional_nodes.to_string()),
        ("unreached nodes", report.unreached_nodes.len().to_string()),
        ("converged", report.converged.to_string()),
        ("rejected records", report.rejected_records.len().to_string()),
        ("outputs", outputs.join(", ")),
    ]
}

fn print_statistics(stats: &GraphStatistics) {
    println!("Nodes:     {}", stats.node_count);
    println!("Edges:     {}", stats.edge_count);
    println!("Isolated:  {}", stats.isolated_nodes);
    println!("Self-loops: {}", stats.self_loops);
    for (label, count) in &stats.edges_by_label {
        println!("  {}: {}", label, count);
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

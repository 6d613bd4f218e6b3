//! Binary entry point for the MiniDB command-line front end.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use minidb::cli::graph::{
    load_graph, lookup, GraphSources, GraphSummary, TopReport, VertexRow,
};
use minidb::cli::store::{load_engine, DeleteReport, RecordsReport, StoreLoadConfig, VerifyReport};
use minidb::cli::{parse_cell, CliError};
use minidb::graph::{bfs, connected_components, dfs, shortest_path, BipartiteBuilder, BipartiteSide};
use minidb::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "minidb",
    version,
    about = "Query CSV tables through balanced indexes and explore bipartite graphs",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        env = "MINIDB_LOG",
        default_value = "warn",
        help = "Log filter directive (e.g. info, minidb=debug)"
    )]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a CSV table into an indexed store and query it
    Store(StoreCmd),
    /// Build a bipartite graph from CSV tables and traverse it
    Graph(GraphCmd),
}

#[derive(Args, Debug)]
struct StoreCmd {
    #[arg(value_name = "CSV")]
    csv: PathBuf,

    #[arg(long = "index", value_name = "COLUMN", help = "Column to index (repeatable)")]
    index: Vec<String>,

    #[arg(long, value_name = "COLUMN", help = "Key column used by search and delete")]
    key: String,

    #[arg(long, help = "Reuse freed slot ids for new records")]
    reuse: bool,

    #[arg(long, help = "Reject repeated key values")]
    strict: bool,

    #[command(subcommand)]
    action: StoreAction,
}

#[derive(Subcommand, Debug)]
enum StoreAction {
    /// Records whose key equals VALUE
    Search { value: String },
    /// Records with LOW <= ATTR <= HIGH, in ascending ATTR order
    Range {
        attr: String,
        low: String,
        high: String,
    },
    /// Delete every record whose key equals VALUE
    Delete { value: String },
    /// Check index invariants and print store statistics
    Verify,
}

#[derive(Args, Debug)]
struct GraphCmd {
    #[arg(long, value_name = "CSV", help = "Vertex rows of the first kind")]
    a: PathBuf,

    #[arg(long, value_name = "CSV", help = "Vertex rows of the second kind")]
    b: PathBuf,

    #[arg(long, value_name = "CSV", help = "Relation rows linking join keys to first-kind ids")]
    a_links: PathBuf,

    #[arg(long, value_name = "CSV", help = "Relation rows linking join keys to second-kind ids")]
    b_links: PathBuf,

    #[arg(long, default_value = "appid", help = "Join column shared by both relation tables")]
    join: String,

    #[arg(long, default_value = "id", help = "Id column of first-kind rows")]
    a_id: String,

    #[arg(long, default_value = "id", help = "Id column of second-kind rows")]
    b_id: String,

    #[arg(long, default_value = "developer_id", help = "First-kind id column of relation rows")]
    a_ref: String,

    #[arg(long, default_value = "publisher_id", help = "Second-kind id column of relation rows")]
    b_ref: String,

    #[arg(long, default_value = "developer", help = "Kind name of the first vertex set")]
    a_kind: String,

    #[arg(long, default_value = "publisher", help = "Kind name of the second vertex set")]
    b_kind: String,

    #[command(subcommand)]
    action: GraphAction,
}

#[derive(Subcommand, Debug)]
enum GraphAction {
    /// Vertex, edge and kind counts
    Summary,
    /// Breadth-first order from the vertex KIND/ID
    Bfs { kind: String, id: String },
    /// Depth-first order from the vertex KIND/ID
    Dfs { kind: String, id: String },
    /// Fewest-hops path from a first-kind id to a second-kind id
    Path { from: String, to: String },
    /// Connected components, largest first
    Components,
    /// Best-connected vertex of each kind and its strongest partners
    Top {
        #[arg(long, default_value_t = 10, help = "Partners listed per vertex")]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log)?;

    match cli.command {
        Command::Store(cmd) => run_store(cli.format, cmd),
        Command::Graph(cmd) => run_graph(cli.format, cmd),
    }
}

fn run_store(format: OutputFormat, cmd: StoreCmd) -> Result<(), Box<dyn Error>> {
    let cfg = StoreLoadConfig {
        path: cmd.csv,
        indexed: cmd.index,
        key: cmd.key,
        reuse_free_slots: cmd.reuse,
        strict: cmd.strict,
    };
    let mut engine = load_engine(&cfg)?;

    match cmd.action {
        StoreAction::Search { value } => {
            let slots = engine.store().find_slots(&cfg.key, &parse_cell(&value))?;
            let report = RecordsReport::collect(engine.store(), &slots);
            emit(format, &report, || print_records_text(&report))?;
        }
        StoreAction::Range { attr, low, high } => {
            let slots = engine
                .store()
                .range_slots(&attr, &parse_cell(&low), &parse_cell(&high))?;
            let report = RecordsReport::collect(engine.store(), &slots);
            emit(format, &report, || print_records_text(&report))?;
        }
        StoreAction::Delete { value } => {
            let key = parse_cell(&value);
            let deleted = engine.delete_record(&key)?;
            let report = DeleteReport {
                key,
                deleted,
                remaining: engine.store().len(),
            };
            emit(format, &report, || {
                println!(
                    "deleted={} key={} remaining={}",
                    report.deleted, report.key, report.remaining
                )
            })?;
        }
        StoreAction::Verify => {
            let report = VerifyReport::build(engine.store());
            emit(format, &report, || print_verify_text(&report))?;
            if !report.success {
                std::process::exit(2);
            }
        }
    }
    Ok(())
}

fn run_graph(format: OutputFormat, cmd: GraphCmd) -> Result<(), Box<dyn Error>> {
    let builder = BipartiteBuilder::new(
        BipartiteSide::new(cmd.a_kind, cmd.a_id, cmd.a_ref),
        BipartiteSide::new(cmd.b_kind, cmd.b_id, cmd.b_ref),
        cmd.join,
    );
    let sources = GraphSources {
        a_rows: cmd.a,
        b_rows: cmd.b,
        a_links: cmd.a_links,
        b_links: cmd.b_links,
    };
    let built = load_graph(&builder, &sources)?;

    match cmd.action {
        GraphAction::Summary => {
            let report = GraphSummary::build(&built);
            emit(format, &report, || {
                println!("vertices={} edges={}", report.vertices, report.edges);
                for (kind, count) in &report.kinds {
                    println!("  {kind}: {count}");
                }
                println!(
                    "shared_keys={} dangling_links={}",
                    report.shared_keys, report.dangling_links
                );
            })?;
        }
        GraphAction::Bfs { kind, id } => {
            let start = lookup(&builder, &built, &kind, &parse_cell(&id))?;
            let order = VertexRow::describe_all(&builder, &built, &bfs(&built.graph, start)?);
            emit(format, &order, || print_vertices_text(&order))?;
        }
        GraphAction::Dfs { kind, id } => {
            let start = lookup(&builder, &built, &kind, &parse_cell(&id))?;
            let order = VertexRow::describe_all(&builder, &built, &dfs(&built.graph, start)?);
            emit(format, &order, || print_vertices_text(&order))?;
        }
        GraphAction::Path { from, to } => {
            let start = lookup(&builder, &built, &builder.a.kind, &parse_cell(&from))?;
            let target = lookup(&builder, &built, &builder.b.kind, &parse_cell(&to))?;
            let path = shortest_path(&built.graph, start, target)?
                .map(|path| VertexRow::describe_all(&builder, &built, &path));
            emit(format, &path, || match &path {
                Some(path) => print_vertices_text(path),
                None => println!("no path"),
            })?;
        }
        GraphAction::Components => {
            let mut components: Vec<Vec<VertexRow>> = connected_components(&built.graph)?
                .iter()
                .map(|component| VertexRow::describe_all(&builder, &built, component))
                .collect();
            components.sort_by(|a, b| b.len().cmp(&a.len()));
            emit(format, &components, || {
                println!("components={}", components.len());
                for (idx, component) in components.iter().enumerate() {
                    println!("#{idx} size={}", component.len());
                }
            })?;
        }
        GraphAction::Top { limit } => {
            let reports = [
                TopReport::build(&builder, &built, &builder.a.kind, limit)?,
                TopReport::build(&builder, &built, &builder.b.kind, limit)?,
            ];
            emit(format, &reports, || {
                for report in &reports {
                    print_top_text(report);
                }
            })?;
        }
    }
    Ok(())
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), CliError>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_records_text(report: &RecordsReport) {
    println!("matched={}", report.matched);
    for entry in &report.records {
        let fields: Vec<String> = entry
            .record
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!("  [{}] {}", entry.slot, fields.join(" "));
    }
}

fn print_verify_text(report: &VerifyReport) {
    println!(
        "records={} slots={} free_slots={}",
        report.records, report.slots, report.free_slots
    );
    for index in &report.indexes {
        println!(
            "  index {}: keys={} entries={} height={}",
            index.attribute, index.keys, index.entries, index.height
        );
    }
    match &report.error {
        None => println!("verify ok"),
        Some(err) => println!("verify failed: {err}"),
    }
}

fn vertex_line(row: &VertexRow) -> String {
    match &row.name {
        Some(name) => format!("{} {} ({})", row.kind, row.id, name),
        None => format!("{} {}", row.kind, row.id),
    }
}

fn print_vertices_text(rows: &[VertexRow]) {
    for row in rows {
        println!("{}", vertex_line(row));
    }
}

fn print_top_text(report: &TopReport) {
    let Some(top) = &report.top else {
        println!("no {} vertices", report.kind);
        return;
    };
    println!(
        "top {}: {} total_weight={}",
        report.kind,
        vertex_line(top),
        report.total_weight
    );
    for row in &report.neighbors {
        println!(
            "  {} weight={}",
            vertex_line(&row.neighbor),
            row.weight
        );
    }
}

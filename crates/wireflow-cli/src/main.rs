//! CLI binary for running, playing, and validating Wireflow snapshots.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};

use wireflow_engine::{
    CapabilityContext, CascadeExecutor, EngineEvent, FlowGraph, GraphStore, Simulation,
    SimulationConfig,
};

#[derive(Parser)]
#[command(name = "wireflow", version, about = "Node-graph flow runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a cascade over a flow snapshot
    Run {
        /// Path to the flow snapshot (.json)
        snapshot: PathBuf,

        /// Node to start the cascade from (default: every entry node)
        #[arg(short, long)]
        node: Option<String>,

        /// Write the post-run state back to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Drive the play-mode scheduler for a number of ticks
    Play {
        /// Path to the flow snapshot (.json)
        snapshot: PathBuf,

        /// Number of ticks to run
        #[arg(short, long, default_value = "3")]
        ticks: u32,

        /// Milliseconds between ticks
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Pacing delay around each node, in milliseconds
        #[arg(long, default_value = "100")]
        pacing_ms: u64,

        /// Write the post-run state back to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Lint a flow snapshot
    Validate {
        /// Path to the flow snapshot (.json)
        snapshot: PathBuf,
    },

    /// Show information about a flow snapshot
    Info {
        /// Path to the flow snapshot (.json)
        snapshot: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            snapshot,
            node,
            output,
        } => cmd_run(&snapshot, node.as_deref(), output.as_deref()).await?,
        Commands::Play {
            snapshot,
            ticks,
            interval_ms,
            pacing_ms,
            output,
        } => cmd_play(&snapshot, ticks, interval_ms, pacing_ms, output.as_deref()).await?,
        Commands::Validate { snapshot } => cmd_validate(&snapshot).await?,
        Commands::Info { snapshot } => cmd_info(&snapshot).await?,
    }

    Ok(())
}

async fn load_graph(path: &Path) -> anyhow::Result<FlowGraph> {
    Ok(wireflow_engine::load_snapshot(path).await?)
}

fn build_executor(graph: FlowGraph) -> CascadeExecutor {
    CascadeExecutor::new(GraphStore::from_graph(graph), CapabilityContext::simulation())
}

/// Print console lines and status changes as they happen.
fn spawn_event_printer(exec: &CascadeExecutor) {
    let mut rx = exec.events().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                EngineEvent::ConsoleAppended { node_id, message } => {
                    println!("  [{node_id}] {message}");
                }
                EngineEvent::ExecutionStatusChanged { node_id, status } => {
                    tracing::debug!(node = %node_id, ?status, "status changed");
                }
                _ => {}
            }
        }
    });
}

async fn cmd_run(path: &Path, node: Option<&str>, output: Option<&Path>) -> anyhow::Result<()> {
    let graph = load_graph(path).await?;
    let exec = build_executor(graph);
    spawn_event_printer(&exec);

    let origins: Vec<String> = match node {
        Some(id) => vec![id.to_string()],
        None => exec.store().entry_node_ids().await,
    };
    if origins.is_empty() {
        anyhow::bail!("no entry nodes found; pass --node to pick a start");
    }

    for origin in origins {
        println!("Cascading from {origin}");
        let report = exec.execute_cascade(&origin).await?;
        println!(
            "  executed {} node(s){}",
            report.executed.len(),
            if report.truncated { " (truncated)" } else { "" }
        );
    }

    write_back(&exec, output).await
}

async fn cmd_play(
    path: &Path,
    ticks: u32,
    interval_ms: u64,
    pacing_ms: u64,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let graph = load_graph(path).await?;
    let playing = graph.nodes.iter().filter(|n| n.is_playing).count();
    if playing == 0 {
        println!("No playing nodes in snapshot; nothing to do");
        return Ok(());
    }

    let exec = build_executor(graph);
    spawn_event_printer(&exec);
    let sim = Simulation::new(
        exec.clone(),
        SimulationConfig {
            tick_interval: Duration::from_millis(interval_ms),
            pacing: Duration::from_millis(pacing_ms),
        },
    );

    for n in 1..=ticks {
        println!("Tick {n}/{ticks}");
        let executed = sim.tick_once().await;
        println!("  executed {executed} node(s)");
        if n < ticks {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        }
    }

    write_back(&exec, output).await
}

async fn write_back(exec: &CascadeExecutor, output: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = output {
        let graph = exec.store().snapshot().await;
        wireflow_engine::save_snapshot(&graph, path).await?;
        println!("Saved state to {}", path.display());
    }
    Ok(())
}

async fn cmd_validate(path: &Path) -> anyhow::Result<()> {
    let graph = load_graph(path).await?;
    let diagnostics = wireflow_engine::validate(&graph);

    if diagnostics.is_empty() {
        println!("Flow is valid");
        return Ok(());
    }

    let mut has_error = false;
    for diag in &diagnostics {
        let severity = match diag.severity {
            wireflow_engine::Severity::Error => {
                has_error = true;
                "ERROR"
            }
            wireflow_engine::Severity::Warning => "WARN",
            wireflow_engine::Severity::Info => "INFO",
        };
        println!("[{}] {}: {}", severity, diag.rule, diag.message);
    }

    if has_error {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let graph = load_graph(path).await?;

    println!("Nodes: {}", graph.nodes.len());
    println!("Edges: {}", graph.edges.len());
    let playing = graph.nodes.iter().filter(|n| n.is_playing).count();
    println!("Playing: {playing}");

    println!("\nNodes:");
    for node in &graph.nodes {
        let flags = match (node.is_active, node.is_playing) {
            (true, true) => " playing",
            (false, _) => " inactive",
            _ => "",
        };
        println!(
            "  {} [{}/{}]{}",
            node.id,
            node.op.phase(),
            node.op.name(),
            flags
        );
    }

    let entries = graph.entry_node_ids();
    if !entries.is_empty() {
        println!("\nEntry nodes: {}", entries.join(", "));
    }

    Ok(())
}

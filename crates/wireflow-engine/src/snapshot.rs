//! Snapshot persistence: flat `{nodes, edges}` JSON files.
//!
//! The format is the external exchange shape: camelCase fields, run-state
//! fields optional. Loading fills `isActive` → true, `isPlaying` → false,
//! `consoleOutput` → empty, `executionStatus` → none; `outputData` stays
//! absent until the node first runs.

use std::path::Path;

use crate::graph::FlowGraph;

/// Save a graph snapshot as pretty-printed JSON.
///
/// Parent directories are created if missing.
pub async fn save_snapshot(graph: &FlowGraph, path: &Path) -> wireflow_types::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let json = serde_json::to_string_pretty(graph)?;
    tokio::fs::write(path, json).await?;
    tracing::debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Load a graph snapshot from a JSON file.
pub async fn load_snapshot(path: &Path) -> wireflow_types::Result<FlowGraph> {
    let json = tokio::fs::read_to_string(path).await?;
    let graph: FlowGraph = serde_json::from_str(&json)?;
    tracing::debug!(
        path = %path.display(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "snapshot loaded"
    );
    Ok(graph)
}

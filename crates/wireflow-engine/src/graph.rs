//! The graph store: the single owner of all nodes and edges.
//!
//! [`FlowGraph`] is the plain, serializable collection; [`GraphStore`] is
//! the shared async handle the executor, scheduler, and user-edit surface
//! all write through. Cloning a `GraphStore` yields another handle to the
//! **same** graph.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wireflow_types::{ConsoleLine, ExecutionStatus, FlowError};

use crate::node::{Node, Phase};

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source_node_id: String,
    pub source_handle: String,
    pub target_node_id: String,
    pub target_handle: String,
}

impl Edge {
    /// Create an edge with a fresh id.
    pub fn connect(
        source_node_id: impl Into<String>,
        source_handle: impl Into<String>,
        target_node_id: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_node_id: source_node_id.into(),
            source_handle: source_handle.into(),
            target_node_id: target_node_id.into(),
            target_handle: target_handle.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// FlowGraph
// ---------------------------------------------------------------------------

/// Node and edge collections. Iteration order is insertion order, which is
/// also the order edges are processed in during propagation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Insert a node, replacing any existing node with the same id.
    pub fn upsert_node(&mut self, node: Node) {
        match self.nodes.iter_mut().find(|n| n.id == node.id) {
            Some(existing) => {
                let version = existing.version + 1;
                *existing = node;
                existing.version = version;
            }
            None => self.nodes.push(node),
        }
    }

    /// Remove a node and every edge touching it. Returns `false` when no
    /// such node exists.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges
            .retain(|e| e.source_node_id != id && e.target_node_id != id);
        true
    }

    /// Insert an edge, replacing any existing edge with the same id.
    pub fn upsert_edge(&mut self, edge: Edge) {
        match self.edges.iter_mut().find(|e| e.id == edge.id) {
            Some(existing) => *existing = edge,
            None => self.edges.push(edge),
        }
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    pub fn edges_into<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target_node_id == node_id)
    }

    pub fn edges_from<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source_node_id == node_id)
    }

    /// Ids of active+playing nodes grouped by phase, store order within
    /// each phase.
    pub fn playing_by_phase(&self) -> Vec<(Phase, Vec<String>)> {
        Phase::ORDER
            .iter()
            .map(|&phase| {
                let ids = self
                    .nodes
                    .iter()
                    .filter(|n| n.is_active && n.is_playing && n.op.phase() == phase)
                    .map(|n| n.id.clone())
                    .collect();
                (phase, ids)
            })
            .collect()
    }

    /// Ids of nodes with no incoming edges (cascade entry points).
    pub fn entry_node_ids(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target_node_id == n.id))
            .map(|n| n.id.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GraphStore {
    inner: Arc<tokio::sync::RwLock<FlowGraph>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::from_graph(FlowGraph::new())
    }

    pub fn from_graph(graph: FlowGraph) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(graph)),
        }
    }

    /// Clone of the current graph.
    pub async fn snapshot(&self) -> FlowGraph {
        self.inner.read().await.clone()
    }

    /// Replace the entire graph (snapshot load).
    pub async fn load(&self, graph: FlowGraph) {
        *self.inner.write().await = graph;
    }

    pub async fn node(&self, id: &str) -> Option<Node> {
        self.inner.read().await.node(id).cloned()
    }

    pub async fn node_version(&self, id: &str) -> Option<u64> {
        self.inner.read().await.node(id).map(|n| n.version)
    }

    pub async fn node_count(&self) -> usize {
        self.inner.read().await.nodes.len()
    }

    pub async fn upsert_node(&self, node: Node) {
        self.inner.write().await.upsert_node(node);
    }

    pub async fn remove_node(&self, id: &str) -> bool {
        self.inner.write().await.remove_node(id)
    }

    pub async fn upsert_edge(&self, edge: Edge) {
        self.inner.write().await.upsert_edge(edge);
    }

    pub async fn remove_edge(&self, id: &str) -> bool {
        self.inner.write().await.remove_edge(id)
    }

    /// Set an input slot's locally configured value (user edit surface).
    pub async fn set_input_value(
        &self,
        node_id: &str,
        key: &str,
        value: Value,
    ) -> wireflow_types::Result<()> {
        let mut graph = self.inner.write().await;
        let node = graph
            .node_mut(node_id)
            .ok_or_else(|| FlowError::NodeNotFound { id: node_id.into() })?;
        let slot = node.input_mut(key).ok_or_else(|| {
            FlowError::Validation(format!("node '{node_id}' has no input slot '{key}'"))
        })?;
        slot.value = value;
        node.version += 1;
        Ok(())
    }

    pub async fn set_active(&self, node_id: &str, active: bool) -> wireflow_types::Result<()> {
        let mut graph = self.inner.write().await;
        let node = graph
            .node_mut(node_id)
            .ok_or_else(|| FlowError::NodeNotFound { id: node_id.into() })?;
        node.is_active = active;
        node.version += 1;
        Ok(())
    }

    pub async fn set_playing(&self, node_id: &str, playing: bool) -> wireflow_types::Result<()> {
        let mut graph = self.inner.write().await;
        let node = graph
            .node_mut(node_id)
            .ok_or_else(|| FlowError::NodeNotFound { id: node_id.into() })?;
        node.is_playing = playing;
        node.version += 1;
        Ok(())
    }

    /// Effective inputs for a node (see [`crate::resolve`]).
    pub async fn resolved_inputs(
        &self,
        node_id: &str,
    ) -> Option<serde_json::Map<String, Value>> {
        let graph = self.inner.read().await;
        graph
            .node(node_id)
            .map(|_| crate::resolve::resolve_inputs(&graph, node_id))
    }

    /// Store a run result onto a node. `expected_version` is the version
    /// observed when inputs were resolved; a mismatch means another writer
    /// got there first (logged, last writer wins).
    pub async fn record_result(
        &self,
        node_id: &str,
        expected_version: u64,
        status: ExecutionStatus,
        output_data: serde_json::Map<String, Value>,
        logs: Vec<ConsoleLine>,
    ) -> wireflow_types::Result<()> {
        let mut graph = self.inner.write().await;
        let node = graph
            .node_mut(node_id)
            .ok_or_else(|| FlowError::NodeNotFound { id: node_id.into() })?;
        if node.version != expected_version {
            tracing::warn!(
                node = node_id,
                expected = expected_version,
                actual = node.version,
                "concurrent write detected, overwriting with newest result"
            );
        }
        node.output_data = Some(output_data);
        node.console_output.extend(logs);
        node.execution_status = status;
        node.version += 1;
        Ok(())
    }

    /// Propagate fresh output downstream (see [`crate::propagate`]).
    pub async fn propagate(
        &self,
        node_id: &str,
        fresh: &serde_json::Map<String, Value>,
    ) -> Vec<String> {
        let mut graph = self.inner.write().await;
        crate::propagate::propagate(&mut graph, node_id, fresh)
    }

    pub async fn playing_by_phase(&self) -> Vec<(Phase, Vec<String>)> {
        self.inner.read().await.playing_by_phase()
    }

    pub async fn entry_node_ids(&self) -> Vec<String> {
        self.inner.read().await.entry_node_ids()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

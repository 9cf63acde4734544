//! Cascade execution: run one node, store its result, push fresh output
//! downstream, and walk the resulting wave with a bounded work queue.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;

use wireflow_types::{ConsoleLine, ExecutionStatus, FlowError, Result};

use crate::events::{EngineEvent, EventEmitter};
use crate::graph::GraphStore;
use crate::handlers::{self, CapabilityContext};

/// Hard ceiling on nodes executed per cascade invocation. A graph large
/// enough to hit this is almost certainly cyclic in a way the visited set
/// alone cannot bound (self-amplifying fan-out), so the cascade is cut.
pub const DEFAULT_STEP_BUDGET: usize = 1_000;

/// What one cascade did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    /// Node ids in execution order.
    pub executed: Vec<String>,
    /// True when the step budget cut the cascade short.
    pub truncated: bool,
}

// ---------------------------------------------------------------------------
// CascadeExecutor
// ---------------------------------------------------------------------------

/// Runs nodes against the shared graph store, with capabilities injected
/// rather than discovered.
#[derive(Clone)]
pub struct CascadeExecutor {
    store: GraphStore,
    caps: CapabilityContext,
    events: EventEmitter,
    step_budget: usize,
}

impl CascadeExecutor {
    pub fn new(store: GraphStore, caps: CapabilityContext) -> Self {
        Self {
            store,
            caps,
            events: EventEmitter::default(),
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }

    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = budget;
        self
    }

    pub fn store(&self) -> GraphStore {
        self.store.clone()
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Execute a single node: resolve inputs, run its handler, store the
    /// result, and propagate fresh output downstream.
    ///
    /// Returns the downstream node ids the output reached. A handler error
    /// becomes node-local error state (status, console line) and an empty
    /// affected list; it is never returned to the caller and never
    /// propagated.
    pub async fn execute_node(&self, node_id: &str) -> Result<Vec<String>> {
        let node = self
            .store
            .node(node_id)
            .await
            .ok_or_else(|| FlowError::NodeNotFound { id: node_id.into() })?;

        if !node.is_active {
            tracing::debug!(node = node_id, "inactive node skipped");
            return Ok(Vec::new());
        }

        let version = node.version;
        let inputs = self
            .store
            .resolved_inputs(node_id)
            .await
            .unwrap_or_default();

        tracing::debug!(node = node_id, op = node.op.name(), "executing node");
        match handlers::run(&node, &inputs, &self.caps).await {
            Ok(output) => {
                let lines: Vec<ConsoleLine> = output
                    .logs
                    .iter()
                    .map(|line| ConsoleLine::now(line.clone()))
                    .collect();
                self.store
                    .record_result(
                        node_id,
                        version,
                        ExecutionStatus::Success,
                        output.data.clone(),
                        lines,
                    )
                    .await?;
                self.emit_result(node_id, ExecutionStatus::Success, &output.logs);
                Ok(self.store.propagate(node_id, &output.data).await)
            }
            Err(err) => {
                tracing::warn!(node = node_id, error = %err, "handler failed");
                let message = format!("error: {err}");
                let mut data = serde_json::Map::new();
                data.insert("error".to_string(), Value::String(err.to_string()));
                self.store
                    .record_result(
                        node_id,
                        version,
                        ExecutionStatus::Error,
                        data,
                        vec![ConsoleLine::now(message.clone())],
                    )
                    .await?;
                self.emit_result(node_id, ExecutionStatus::Error, &[message]);
                Ok(Vec::new())
            }
        }
    }

    /// Execute a full cascade starting at `origin`.
    ///
    /// Iterative work queue with a per-invocation visited set: a node that
    /// comes up again is a detected cycle and is skipped, so acyclic graphs
    /// execute each reachable node exactly once. The step budget bounds
    /// pathological graphs; exceeding it truncates the cascade.
    pub async fn execute_cascade(&self, origin: &str) -> Result<CascadeReport> {
        self.events.emit(EngineEvent::CascadeStarted {
            origin: origin.to_string(),
        });

        let mut queue: VecDeque<String> = VecDeque::from([origin.to_string()]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut executed: Vec<String> = Vec::new();
        let mut truncated = false;

        while let Some(node_id) = queue.pop_front() {
            if !visited.insert(node_id.clone()) {
                tracing::warn!(node = %node_id, origin, "cycle detected, skipping revisit");
                continue;
            }
            if executed.len() >= self.step_budget {
                tracing::warn!(
                    origin,
                    budget = self.step_budget,
                    "cascade exceeded step budget, truncating"
                );
                truncated = true;
                break;
            }

            let affected = self.execute_node(&node_id).await?;
            executed.push(node_id);
            queue.extend(affected);
        }

        let report = CascadeReport {
            executed,
            truncated,
        };
        self.events.emit(EngineEvent::CascadeCompleted {
            origin: origin.to_string(),
            executed: report.executed.clone(),
            truncated: report.truncated,
        });
        Ok(report)
    }

    fn emit_result(&self, node_id: &str, status: ExecutionStatus, logs: &[String]) {
        self.events.emit(EngineEvent::ExecutionStatusChanged {
            node_id: node_id.to_string(),
            status,
        });
        for line in logs {
            self.events.emit(EngineEvent::ConsoleAppended {
                node_id: node_id.to_string(),
                message: line.clone(),
            });
        }
    }
}

//! Graph lint: advisory diagnostics over a [`FlowGraph`].
//!
//! The engine itself never rejects a structurally dubious graph — dangling
//! edges and contested slots are skipped at execution time. This pass makes
//! those spots visible so tooling can surface them before a run.

use std::collections::{HashMap, HashSet};

use crate::graph::FlowGraph;
use crate::node::Phase;

// ---------------------------------------------------------------------------
// Diagnostic types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// LintRule trait
// ---------------------------------------------------------------------------

pub trait LintRule: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, graph: &FlowGraph) -> Vec<Diagnostic>;
}

fn diagnostic(
    rule: &dyn LintRule,
    severity: Severity,
    message: String,
    node_id: Option<String>,
) -> Diagnostic {
    Diagnostic {
        rule: rule.name().into(),
        severity,
        message,
        node_id,
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Edges must reference nodes that exist.
struct EdgeEndpointsExistRule;
impl LintRule for EdgeEndpointsExistRule {
    fn name(&self) -> &str {
        "edge_endpoints_exist"
    }
    fn apply(&self, graph: &FlowGraph) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for edge in &graph.edges {
            for (end, id) in [
                ("source", &edge.source_node_id),
                ("target", &edge.target_node_id),
            ] {
                if graph.node(id).is_none() {
                    out.push(diagnostic(
                        self,
                        Severity::Error,
                        format!("edge {} references missing {end} node {id:?}", edge.id),
                        None,
                    ));
                }
            }
        }
        out
    }
}

/// Edge handles must name a declared output slot on the source and a
/// declared input slot on the target.
struct EdgeHandlesDeclaredRule;
impl LintRule for EdgeHandlesDeclaredRule {
    fn name(&self) -> &str {
        "edge_handles_declared"
    }
    fn apply(&self, graph: &FlowGraph) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for edge in &graph.edges {
            if let Some(source) = graph.node(&edge.source_node_id) {
                if !source.has_output(&edge.source_handle) {
                    out.push(diagnostic(
                        self,
                        Severity::Warning,
                        format!(
                            "edge {} reads undeclared output {:?} of node {}",
                            edge.id, edge.source_handle, source.id
                        ),
                        Some(source.id.clone()),
                    ));
                }
            }
            if let Some(target) = graph.node(&edge.target_node_id) {
                if target.input(&edge.target_handle).is_none() {
                    out.push(diagnostic(
                        self,
                        Severity::Warning,
                        format!(
                            "edge {} writes undeclared input {:?} of node {}",
                            edge.id, edge.target_handle, target.id
                        ),
                        Some(target.id.clone()),
                    ));
                }
            }
        }
        out
    }
}

/// Several edges feeding one input slot: the last one processed wins, which
/// is rarely what the author meant.
struct ContestedSlotRule;
impl LintRule for ContestedSlotRule {
    fn name(&self) -> &str {
        "contested_input_slot"
    }
    fn apply(&self, graph: &FlowGraph) -> Vec<Diagnostic> {
        let mut feeders: HashMap<(String, String), usize> = HashMap::new();
        for edge in &graph.edges {
            *feeders
                .entry((edge.target_node_id.clone(), edge.target_handle.clone()))
                .or_default() += 1;
        }
        feeders
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((node_id, handle), count)| {
                diagnostic(
                    self,
                    Severity::Warning,
                    format!(
                        "{count} edges feed input {handle:?} of node {node_id}; only the last processed value is kept"
                    ),
                    Some(node_id),
                )
            })
            .collect()
    }
}

/// A playing node that is inactive never executes.
struct PlayingButInactiveRule;
impl LintRule for PlayingButInactiveRule {
    fn name(&self) -> &str {
        "playing_but_inactive"
    }
    fn apply(&self, graph: &FlowGraph) -> Vec<Diagnostic> {
        graph
            .nodes
            .iter()
            .filter(|n| n.is_playing && !n.is_active)
            .map(|n| {
                diagnostic(
                    self,
                    Severity::Warning,
                    format!("node {} is playing but inactive; it will never run", n.id),
                    Some(n.id.clone()),
                )
            })
            .collect()
    }
}

/// Edges leaving a sink are dead: sink output never propagates.
struct EdgeOutOfSinkRule;
impl LintRule for EdgeOutOfSinkRule {
    fn name(&self) -> &str {
        "edge_out_of_sink"
    }
    fn apply(&self, graph: &FlowGraph) -> Vec<Diagnostic> {
        graph
            .edges
            .iter()
            .filter_map(|edge| {
                let source = graph.node(&edge.source_node_id)?;
                (source.op.phase() == Phase::Sink).then(|| {
                    diagnostic(
                        self,
                        Severity::Warning,
                        format!(
                            "edge {} leaves sink node {}; sink output is never propagated",
                            edge.id, source.id
                        ),
                        Some(source.id.clone()),
                    )
                })
            })
            .collect()
    }
}

/// Cycles terminate (the cascade skips revisits) but usually indicate a
/// wiring mistake.
struct CycleRule;
impl LintRule for CycleRule {
    fn name(&self) -> &str {
        "cycle"
    }
    fn apply(&self, graph: &FlowGraph) -> Vec<Diagnostic> {
        let mut visiting: HashSet<&str> = HashSet::new();
        let mut done: HashSet<&str> = HashSet::new();
        let mut cyclic: Vec<String> = Vec::new();

        fn walk<'g>(
            graph: &'g FlowGraph,
            id: &'g str,
            visiting: &mut HashSet<&'g str>,
            done: &mut HashSet<&'g str>,
            cyclic: &mut Vec<String>,
        ) {
            if done.contains(id) {
                return;
            }
            if !visiting.insert(id) {
                if !cyclic.iter().any(|c| c == id) {
                    cyclic.push(id.to_string());
                }
                return;
            }
            for edge in graph.edges_from(id) {
                if graph.node(&edge.target_node_id).is_some() {
                    walk(graph, &edge.target_node_id, visiting, done, cyclic);
                }
            }
            visiting.remove(id);
            done.insert(id);
        }

        for node in &graph.nodes {
            walk(graph, &node.id, &mut visiting, &mut done, &mut cyclic);
        }

        cyclic
            .into_iter()
            .map(|id| {
                diagnostic(
                    self,
                    Severity::Warning,
                    format!("node {id} participates in a cycle; cascades will skip the revisit"),
                    Some(id),
                )
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run every lint rule. Advisory: returns diagnostics, never fails.
pub fn validate(graph: &FlowGraph) -> Vec<Diagnostic> {
    let rules: Vec<Box<dyn LintRule>> = vec![
        Box::new(EdgeEndpointsExistRule),
        Box::new(EdgeHandlesDeclaredRule),
        Box::new(ContestedSlotRule),
        Box::new(PlayingButInactiveRule),
        Box::new(EdgeOutOfSinkRule),
        Box::new(CycleRule),
    ];
    rules.iter().flat_map(|rule| rule.apply(graph)).collect()
}

/// Like [`validate`], but fails when any `Error`-severity diagnostic exists.
pub fn validate_or_raise(graph: &FlowGraph) -> wireflow_types::Result<Vec<Diagnostic>> {
    let diagnostics = validate(graph);
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.clone())
        .collect();
    if !errors.is_empty() {
        return Err(wireflow_types::FlowError::GraphIntegrity(
            errors.join("; "),
        ));
    }
    Ok(diagnostics)
}

//! Input resolution: compute a node's effective input snapshot.
//!
//! Edge-delivered values always take precedence over locally configured
//! slot values. Pure read over the graph; no side effects.

use serde_json::Value;

use crate::graph::FlowGraph;

/// Resolve the effective inputs for `node_id`.
///
/// For every edge targeting the node, the source node's last `output_data`
/// at `source_handle` (if any) is bound to `target_handle`. Edges are
/// processed in store order, so when several edges target the same slot the
/// last one wins. Input slots left unbound fall back to their configured
/// value.
pub fn resolve_inputs(graph: &FlowGraph, node_id: &str) -> serde_json::Map<String, Value> {
    let mut resolved = serde_json::Map::new();

    for edge in graph.edges_into(node_id) {
        let Some(source) = graph.node(&edge.source_node_id) else {
            continue;
        };
        let Some(data) = &source.output_data else {
            continue;
        };
        if let Some(value) = data.get(&edge.source_handle) {
            resolved.insert(edge.target_handle.clone(), value.clone());
        }
    }

    if let Some(node) = graph.node(node_id) {
        for slot in &node.inputs {
            if !resolved.contains_key(&slot.key) {
                resolved.insert(slot.key.clone(), slot.value.clone());
            }
        }
    }

    resolved
}

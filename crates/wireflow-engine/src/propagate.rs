//! Cascade propagation: deliver fresh output to downstream input slots.

use serde_json::Value;

use crate::graph::FlowGraph;
use crate::node::Phase;

/// Write `fresh` output values into downstream nodes' input slots.
///
/// For every edge leaving `node_id`: if the fresh output defines the edge's
/// `source_handle`, the value is copied into the target node's input slot
/// matching `target_handle`. Returns the affected target node ids,
/// deduplicated, in edge iteration order. Sink outputs are terminal and
/// never propagate.
pub fn propagate(
    graph: &mut FlowGraph,
    node_id: &str,
    fresh: &serde_json::Map<String, Value>,
) -> Vec<String> {
    if let Some(node) = graph.node(node_id) {
        if node.op.phase() == Phase::Sink {
            return Vec::new();
        }
    }

    let deliveries: Vec<(String, String, Value)> = graph
        .edges_from(node_id)
        .filter_map(|edge| {
            fresh.get(&edge.source_handle).map(|value| {
                (
                    edge.target_node_id.clone(),
                    edge.target_handle.clone(),
                    value.clone(),
                )
            })
        })
        .collect();

    let mut affected: Vec<String> = Vec::new();
    for (target_id, target_handle, value) in deliveries {
        let Some(target) = graph.node_mut(&target_id) else {
            // Dangling edge: ignored, not rejected.
            tracing::debug!(edge_target = %target_id, "skipping edge to missing node");
            continue;
        };
        let Some(slot) = target.input_mut(&target_handle) else {
            tracing::debug!(
                node = %target_id,
                handle = %target_handle,
                "skipping edge to unknown input slot"
            );
            continue;
        };
        slot.value = value;
        target.version += 1;
        if !affected.iter().any(|id| id == &target_id) {
            affected.push(target_id);
        }
    }

    affected
}

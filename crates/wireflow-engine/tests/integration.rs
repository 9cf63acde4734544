//! End-to-end engine tests: a snapshot is loaded, cascades run, the
//! scheduler ticks, and the observable node state matches the wiring.

use serde_json::json;
use tempfile::tempdir;

use wireflow_engine::{
    load_snapshot, save_snapshot, validate, CapabilityContext, CascadeExecutor, Edge, EngineEvent,
    FlowGraph, GraphStore, Node, NodeOp, Severity, Simulation, SimulationConfig,
};
use wireflow_engine::node::{ActOp, BranchOp, SinkOp, SourceOp};
use wireflow_types::ExecutionStatus;

fn executor(store: GraphStore) -> CascadeExecutor {
    CascadeExecutor::new(store, CapabilityContext::simulation())
}

/// source(placeholder) -> branch(condition value>=10) -> two display sinks.
fn branching_graph(seed: serde_json::Value) -> FlowGraph {
    let mut graph = FlowGraph::new();
    graph.upsert_node(
        Node::new("seed", NodeOp::Source(SourceOp::Placeholder))
            .with_input("value", "number", seed)
            .with_output("value", "Value", "number"),
    );
    graph.upsert_node(
        Node::new("gate", NodeOp::Branch(BranchOp::Condition))
            .with_input("value", "number", json!(null))
            .with_input("condition", "string", json!("value>=10"))
            .with_output("true", "True", "boolean")
            .with_output("false", "False", "boolean"),
    );
    graph.upsert_node(
        Node::new("yes", NodeOp::Sink(SinkOp::Display)).with_input("value", "any", json!(null)),
    );
    graph.upsert_node(
        Node::new("no", NodeOp::Sink(SinkOp::Display)).with_input("value", "any", json!(null)),
    );
    graph.upsert_edge(Edge::connect("seed", "value", "gate", "value"));
    graph.upsert_edge(Edge::connect("gate", "true", "yes", "value"));
    graph.upsert_edge(Edge::connect("gate", "false", "no", "value"));
    graph
}

#[tokio::test]
async fn cascade_routes_through_branch_outputs() {
    let store = GraphStore::from_graph(branching_graph(json!(12)));
    let exec = executor(store.clone());

    let report = exec.execute_cascade("seed").await.unwrap();
    assert!(!report.truncated);
    // Both sinks run (both branch outputs are always produced); the values
    // they display differ.
    assert_eq!(report.executed.len(), 4);

    let yes = store.node("yes").await.unwrap();
    let no = store.node("no").await.unwrap();
    assert_eq!(yes.output_data.unwrap()["display"], json!("true"));
    assert_eq!(no.output_data.unwrap()["display"], json!("false"));
}

#[tokio::test]
async fn branch_is_idempotent_across_cascades() {
    let store = GraphStore::from_graph(branching_graph(json!(12)));
    let exec = executor(store.clone());

    exec.execute_cascade("seed").await.unwrap();
    let first = store.node("gate").await.unwrap().output_data;
    exec.execute_cascade("seed").await.unwrap();
    let second = store.node("gate").await.unwrap().output_data;

    assert_eq!(first, second);
}

#[tokio::test]
async fn failing_node_isolates_its_branch_of_the_wave() {
    let mut graph = FlowGraph::new();
    graph.upsert_node(
        Node::new("seed", NodeOp::Source(SourceOp::Placeholder))
            .with_input("value", "string", json!("payload"))
            .with_output("value", "Value", "string"),
    );
    graph.upsert_node(
        Node::new("bad", NodeOp::Act(ActOp::HttpRequest))
            .with_input("url", "string", json!("https://api.example/500"))
            .with_input("value", "any", json!(null))
            .with_output("body", "Body", "object"),
    );
    graph.upsert_node(
        Node::new("good", NodeOp::Act(ActOp::Uppercase))
            .with_input("value", "string", json!(null))
            .with_output("value", "Value", "string"),
    );
    graph.upsert_node(
        Node::new("bad_out", NodeOp::Sink(SinkOp::Display))
            .with_input("value", "any", json!(null)),
    );
    graph.upsert_node(
        Node::new("good_out", NodeOp::Sink(SinkOp::Display))
            .with_input("value", "any", json!(null)),
    );
    graph.upsert_edge(Edge::connect("seed", "value", "bad", "value"));
    graph.upsert_edge(Edge::connect("seed", "value", "good", "value"));
    graph.upsert_edge(Edge::connect("bad", "body", "bad_out", "value"));
    graph.upsert_edge(Edge::connect("good", "value", "good_out", "value"));

    let store = GraphStore::from_graph(graph);
    let exec = executor(store.clone());
    exec.execute_cascade("seed").await.unwrap();

    assert_eq!(
        store.node("bad").await.unwrap().execution_status,
        ExecutionStatus::Error
    );
    // The failure never reached its sink...
    assert_eq!(
        store.node("bad_out").await.unwrap().execution_status,
        ExecutionStatus::None
    );
    // ...while the sibling branch completed.
    let good_out = store.node("good_out").await.unwrap();
    assert_eq!(good_out.execution_status, ExecutionStatus::Success);
    assert_eq!(good_out.output_data.unwrap()["display"], json!("PAYLOAD"));
}

#[tokio::test]
async fn snapshot_survives_a_run_and_a_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("flow.json");
    save_snapshot(&branching_graph(json!(3)), &path).await.unwrap();

    let loaded = load_snapshot(&path).await.unwrap();
    assert!(validate(&loaded).is_empty());

    let store = GraphStore::from_graph(loaded);
    let exec = executor(store.clone());
    exec.execute_cascade("seed").await.unwrap();

    // Persist the post-run state and read it back.
    let after = store.snapshot().await;
    save_snapshot(&after, &path).await.unwrap();
    let reloaded = load_snapshot(&path).await.unwrap();

    let gate = reloaded.node("gate").unwrap();
    assert_eq!(gate.execution_status, ExecutionStatus::Success);
    assert_eq!(gate.output_data.as_ref().unwrap()["true"], json!(false));
    assert!(!gate.console_output.is_empty());
}

#[tokio::test]
async fn scheduler_drives_playing_nodes_in_phase_order() {
    let mut graph = branching_graph(json!(42));
    for id in ["seed", "gate", "yes", "no"] {
        graph.node_mut(id).unwrap().is_playing = true;
    }
    let store = GraphStore::from_graph(graph);
    let exec = executor(store.clone());
    let mut rx = exec.events().subscribe();
    let sim = Simulation::new(
        exec,
        SimulationConfig {
            tick_interval: std::time::Duration::from_millis(10),
            pacing: std::time::Duration::from_millis(1),
        },
    );

    let executed = sim.tick_once().await;
    assert_eq!(executed, 4);

    let mut order = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let EngineEvent::CurrentlyExecutingChanged { node_id: Some(id) } = event {
            order.push(id);
        }
    }
    assert_eq!(order[0], "seed");
    assert_eq!(order[1], "gate");
    // Sinks last, in store order.
    assert_eq!(&order[2..], ["yes".to_string(), "no".to_string()]);

    // Single-node ticks still flowed data: the source ran before the
    // branch, so the branch saw the fresh seed within the same tick.
    let yes = store.node("yes").await.unwrap();
    assert_eq!(yes.output_data.unwrap()["display"], json!("true"));
}

#[tokio::test]
async fn one_playing_node_per_phase_ticks_in_phase_order() {
    // Inserted in reverse phase order on purpose.
    let mut graph = FlowGraph::new();
    graph.upsert_node(
        Node::new("p5", NodeOp::Sink(SinkOp::Display))
            .with_input("value", "any", json!(null))
            .playing(),
    );
    graph.upsert_node(
        Node::new("p4", NodeOp::Branch(BranchOp::Condition))
            .with_input("value", "number", json!(1))
            .with_input("condition", "string", json!("value"))
            .with_output("true", "True", "boolean")
            .playing(),
    );
    graph.upsert_node(
        Node::new("p3", NodeOp::Act(ActOp::Uppercase))
            .with_input("value", "string", json!("x"))
            .with_output("value", "Value", "string")
            .playing(),
    );
    graph.upsert_node(
        Node::new("p2", NodeOp::Transform(wireflow_engine::TransformOp::Generate))
            .with_input("value", "string", json!("hi"))
            .with_output("output", "Output", "string")
            .playing(),
    );
    graph.upsert_node(
        Node::new("p1", NodeOp::Source(SourceOp::Placeholder))
            .with_input("value", "string", json!("seed"))
            .with_output("value", "Value", "string")
            .playing(),
    );

    let exec = executor(GraphStore::from_graph(graph));
    let mut rx = exec.events().subscribe();
    let sim = Simulation::new(
        exec,
        SimulationConfig {
            tick_interval: std::time::Duration::from_millis(10),
            pacing: std::time::Duration::from_millis(1),
        },
    );
    sim.tick_once().await;

    let mut order = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let EngineEvent::CurrentlyExecutingChanged { node_id: Some(id) } = event {
            order.push(id);
        }
    }
    assert_eq!(order, vec!["p1", "p2", "p3", "p4", "p5"]);
}

#[tokio::test]
async fn lint_flags_what_the_engine_tolerates() {
    let mut graph = branching_graph(json!(1));
    graph.upsert_edge(Edge::connect("ghost", "value", "gate", "value"));
    let diags = validate(&graph);
    assert!(diags.iter().any(|d| d.severity == Severity::Error));

    // The engine still runs the graph despite the lint error.
    let store = GraphStore::from_graph(graph);
    let exec = executor(store);
    let report = exec.execute_cascade("seed").await.unwrap();
    assert_eq!(report.executed.len(), 4);
}

#[tokio::test]
async fn generation_flows_into_a_sink() {
    let mut graph = FlowGraph::new();
    graph.upsert_node(
        Node::new("prompt", NodeOp::Source(SourceOp::Placeholder))
            .with_input("value", "string", json!("summarize the week"))
            .with_output("value", "Value", "string"),
    );
    graph.upsert_node(
        Node::new("llm", NodeOp::Transform(wireflow_engine::TransformOp::Generate))
            .with_input("value", "string", json!(null))
            .with_input("model", "string", json!("claude-sonnet"))
            .with_output("output", "Output", "string"),
    );
    graph.upsert_node(
        Node::new("show", NodeOp::Sink(SinkOp::Display)).with_input("value", "any", json!(null)),
    );
    graph.upsert_edge(Edge::connect("prompt", "value", "llm", "value"));
    graph.upsert_edge(Edge::connect("llm", "output", "show", "value"));

    let store = GraphStore::from_graph(graph);
    let exec = executor(store.clone());
    exec.execute_cascade("prompt").await.unwrap();

    let llm = store.node("llm").await.unwrap();
    let data = llm.output_data.unwrap();
    // No anthropic provider registered: deterministic fallback filled in.
    assert_eq!(data["fallbackUsed"], json!(true));
    let shown = store.node("show").await.unwrap().output_data.unwrap();
    assert_eq!(shown["display"], data["output"]);
}

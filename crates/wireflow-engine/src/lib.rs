//! Node-graph execution engine: graph store, input resolution, cascade
//! propagation, handler dispatch, batch simulation, and graph lint.
//!
//! This crate implements the core Wireflow runner: a directed graph of
//! typed processing nodes where executing one node resolves its inputs,
//! runs its handler, stores the result, and pushes fresh output into the
//! input slots of downstream nodes.

pub mod events;
pub mod executor;
pub mod expr;
pub mod graph;
pub mod handlers;
pub mod node;
pub mod propagate;
pub mod resolve;
pub mod scheduler;
pub mod snapshot;
pub mod validation;

pub use self::events::{EngineEvent, EventEmitter};
pub use self::executor::{CascadeExecutor, CascadeReport, DEFAULT_STEP_BUDGET};
pub use self::expr::{BranchExpr, CmpOp};
pub use self::graph::{Edge, FlowGraph, GraphStore};
pub use self::handlers::{CapabilityContext, HandlerOutput};
pub use self::node::{
    ActOp, BranchOp, InputSlot, Node, NodeOp, OutputSlot, Phase, SinkOp, SourceOp, TransformOp,
};
pub use self::propagate::propagate;
pub use self::resolve::resolve_inputs;
pub use self::scheduler::{Simulation, SimulationConfig};
pub use self::snapshot::{load_snapshot, save_snapshot};
pub use self::validation::{validate, validate_or_raise, Diagnostic, LintRule, Severity};

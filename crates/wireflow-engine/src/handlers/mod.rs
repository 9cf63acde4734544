//! Node handler dispatch.
//!
//! Each [`NodeOp`](crate::node::NodeOp) variant maps to exactly one handler;
//! dispatch is an exhaustive match so adding an operation without a handler
//! fails to compile. Handlers that model external calls (HTTP, generation,
//! messaging) await a short fixed delay so concurrent triggers interleave
//! the way real calls would.

mod act;
mod branch;
mod sink;
mod source;
mod transform;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use wireflow_bots::{Messenger, RecordingMessenger};
use wireflow_gen::GeneratorRegistry;
use wireflow_types::Result;

use crate::node::{Node, NodeOp};

/// Simulated external-call latency for HTTP, generation, and messaging
/// handlers.
pub(crate) const EXTERNAL_CALL_DELAY_MS: u64 = 25;

// ---------------------------------------------------------------------------
// CapabilityContext
// ---------------------------------------------------------------------------

/// External capabilities handlers may call, injected explicitly rather than
/// reached through any global state.
#[derive(Clone)]
pub struct CapabilityContext {
    pub generators: Arc<GeneratorRegistry>,
    pub messengers: HashMap<String, Arc<dyn Messenger>>,
}

impl CapabilityContext {
    pub fn new(
        generators: Arc<GeneratorRegistry>,
        messengers: HashMap<String, Arc<dyn Messenger>>,
    ) -> Self {
        Self {
            generators,
            messengers,
        }
    }

    /// Fully offline context: the simulation generator plus recording
    /// messengers for both chat services.
    pub fn simulation() -> Self {
        let mut messengers: HashMap<String, Arc<dyn Messenger>> = HashMap::new();
        messengers.insert(
            "telegram".into(),
            Arc::new(RecordingMessenger::new("telegram")),
        );
        messengers.insert(
            "discord".into(),
            Arc::new(RecordingMessenger::new("discord")),
        );
        Self {
            generators: Arc::new(GeneratorRegistry::new()),
            messengers,
        }
    }

    pub fn messenger(&self, service: &str) -> Option<Arc<dyn Messenger>> {
        self.messengers.get(service).cloned()
    }
}

// ---------------------------------------------------------------------------
// HandlerOutput
// ---------------------------------------------------------------------------

/// What a handler produced: the node's fresh `output_data` plus console
/// lines to append.
#[derive(Debug, Default)]
pub struct HandlerOutput {
    pub data: serde_json::Map<String, Value>,
    pub logs: Vec<String>,
}

impl HandlerOutput {
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn log(mut self, line: impl Into<String>) -> Self {
        self.logs.push(line.into());
        self
    }
}

/// Run the handler for `node` against its resolved inputs.
pub async fn run(
    node: &Node,
    inputs: &serde_json::Map<String, Value>,
    caps: &CapabilityContext,
) -> Result<HandlerOutput> {
    match &node.op {
        NodeOp::Source(op) => source::run(*op, node, inputs),
        NodeOp::Transform(op) => transform::run(*op, inputs, caps).await,
        NodeOp::Act(op) => act::run(*op, node, inputs, caps).await,
        NodeOp::Branch(op) => Ok(branch::run(*op, inputs)),
        NodeOp::Sink(op) => Ok(sink::run(*op, inputs)),
    }
}

/// Resolved `value` input, or null when the slot is absent.
pub(crate) fn value_input(inputs: &serde_json::Map<String, Value>) -> Value {
    inputs.get("value").cloned().unwrap_or(Value::Null)
}

/// Human-readable rendering used by log lines and text-oriented handlers.
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

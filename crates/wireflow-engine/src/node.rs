//! Node data model: execution phases, the closed operation type, and slots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wireflow_types::{ConsoleLine, ExecutionStatus};

// ---------------------------------------------------------------------------
// Phase — fixed execution-order categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Source,
    Transform,
    Act,
    Branch,
    Sink,
}

impl Phase {
    /// The order the batch scheduler walks phases in.
    pub const ORDER: [Phase; 5] = [
        Phase::Source,
        Phase::Transform,
        Phase::Act,
        Phase::Branch,
        Phase::Sink,
    ];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Source => "source",
            Phase::Transform => "transform",
            Phase::Act => "act",
            Phase::Branch => "branch",
            Phase::Sink => "sink",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// NodeOp — closed tagged operation type
//
// Serialized as {"kind": ..., "name": ...} so snapshots keep the external
// two-level shape while dispatch stays an exhaustive match.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum NodeOp {
    Source(SourceOp),
    Transform(TransformOp),
    Act(ActOp),
    Branch(BranchOp),
    Sink(SinkOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOp {
    /// Echo a configured value.
    Placeholder,
    /// Fabricate a structured inbound chat message payload.
    InboundMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOp {
    Generate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActOp {
    HttpRequest,
    Generate,
    Flatten,
    Uppercase,
    Lowercase,
    Filter,
    AddMetadata,
    NotifyTelegram,
    NotifyDiscord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchOp {
    Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkOp {
    Display,
}

impl NodeOp {
    pub fn phase(&self) -> Phase {
        match self {
            NodeOp::Source(_) => Phase::Source,
            NodeOp::Transform(_) => Phase::Transform,
            NodeOp::Act(_) => Phase::Act,
            NodeOp::Branch(_) => Phase::Branch,
            NodeOp::Sink(_) => Phase::Sink,
        }
    }

    /// The handler name within the kind, for logs and display.
    pub fn name(&self) -> &'static str {
        match self {
            NodeOp::Source(SourceOp::Placeholder) => "placeholder",
            NodeOp::Source(SourceOp::InboundMessage) => "inbound_message",
            NodeOp::Transform(TransformOp::Generate) => "generate",
            NodeOp::Act(ActOp::HttpRequest) => "http_request",
            NodeOp::Act(ActOp::Generate) => "generate",
            NodeOp::Act(ActOp::Flatten) => "flatten",
            NodeOp::Act(ActOp::Uppercase) => "uppercase",
            NodeOp::Act(ActOp::Lowercase) => "lowercase",
            NodeOp::Act(ActOp::Filter) => "filter",
            NodeOp::Act(ActOp::AddMetadata) => "add_metadata",
            NodeOp::Act(ActOp::NotifyTelegram) => "notify_telegram",
            NodeOp::Act(ActOp::NotifyDiscord) => "notify_discord",
            NodeOp::Branch(BranchOp::Condition) => "condition",
            NodeOp::Sink(SinkOp::Display) => "display",
        }
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSlot {
    pub key: String,
    #[serde(rename = "type")]
    pub slot_type: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl InputSlot {
    pub fn new(key: impl Into<String>, slot_type: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            slot_type: slot_type.into(),
            value,
            options: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSlot {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub slot_type: String,
}

impl OutputSlot {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        slot_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            slot_type: slot_type.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub op: NodeOp,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub inputs: Vec<InputSlot>,
    #[serde(default)]
    pub outputs: Vec<OutputSlot>,
    /// Key→value map from the last successful or failed run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_data: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub console_output: Vec<ConsoleLine>,
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    /// Bumped on every store write to this node; used to detect lost
    /// updates from racing triggers. Not part of the snapshot.
    #[serde(skip)]
    pub version: u64,
}

fn default_true() -> bool {
    true
}

impl Node {
    pub fn new(id: impl Into<String>, op: NodeOp) -> Self {
        Self {
            id: id.into(),
            op,
            is_active: true,
            is_playing: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            output_data: None,
            console_output: Vec::new(),
            execution_status: ExecutionStatus::None,
            version: 0,
        }
    }

    pub fn with_input(mut self, key: &str, slot_type: &str, value: Value) -> Self {
        self.inputs.push(InputSlot::new(key, slot_type, value));
        self
    }

    pub fn with_output(mut self, key: &str, label: &str, slot_type: &str) -> Self {
        self.outputs.push(OutputSlot::new(key, label, slot_type));
        self
    }

    pub fn playing(mut self) -> Self {
        self.is_playing = true;
        self
    }

    pub fn input(&self, key: &str) -> Option<&InputSlot> {
        self.inputs.iter().find(|s| s.key == key)
    }

    pub fn input_mut(&mut self, key: &str) -> Option<&mut InputSlot> {
        self.inputs.iter_mut().find(|s| s.key == key)
    }

    pub fn has_output(&self, key: &str) -> bool {
        self.outputs.iter().any(|s| s.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn op_serializes_as_kind_and_name() {
        let json = serde_json::to_value(NodeOp::Act(ActOp::HttpRequest)).unwrap();
        assert_eq!(json, json!({"kind": "act", "name": "http_request"}));

        let json = serde_json::to_value(NodeOp::Source(SourceOp::Placeholder)).unwrap();
        assert_eq!(json, json!({"kind": "source", "name": "placeholder"}));
    }

    #[test]
    fn op_deserializes_from_kind_and_name() {
        let op: NodeOp =
            serde_json::from_value(json!({"kind": "branch", "name": "condition"})).unwrap();
        assert_eq!(op, NodeOp::Branch(BranchOp::Condition));
    }

    #[test]
    fn unknown_name_is_a_parse_error_not_a_silent_default() {
        let result =
            serde_json::from_value::<NodeOp>(json!({"kind": "source", "name": "mystery"}));
        assert!(result.is_err());
    }

    #[test]
    fn phase_order_matches_kind() {
        assert_eq!(NodeOp::Source(SourceOp::Placeholder).phase(), Phase::Source);
        assert_eq!(NodeOp::Sink(SinkOp::Display).phase(), Phase::Sink);
        assert!(Phase::Source < Phase::Transform);
        assert!(Phase::Branch < Phase::Sink);
        assert_eq!(Phase::ORDER.len(), 5);
    }

    #[test]
    fn node_serializes_flattened_with_camel_case() {
        let node = Node::new("n1", NodeOp::Branch(BranchOp::Condition))
            .with_input("value", "number", json!(5))
            .with_output("true", "True", "boolean");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["id"], "n1");
        assert_eq!(json["kind"], "branch");
        assert_eq!(json["name"], "condition");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["isPlaying"], false);
        assert_eq!(json["inputs"][0]["key"], "value");
        assert_eq!(json["inputs"][0]["type"], "number");
        assert_eq!(json["outputs"][0]["label"], "True");
        // Not run yet: no outputData key at all.
        assert!(json.get("outputData").is_none());
    }

    #[test]
    fn node_deserializes_with_run_state_defaults() {
        let node: Node = serde_json::from_value(json!({
            "id": "n2",
            "kind": "act",
            "name": "uppercase",
            "inputs": [{"key": "value", "type": "string"}]
        }))
        .unwrap();
        assert!(node.is_active);
        assert!(!node.is_playing);
        assert!(node.console_output.is_empty());
        assert_eq!(node.execution_status, ExecutionStatus::None);
        assert!(node.output_data.is_none());
        assert_eq!(node.version, 0);
        // Missing slot value defaults to null.
        assert_eq!(node.inputs[0].value, Value::Null);
    }

    #[test]
    fn input_lookup_by_key() {
        let mut node = Node::new("n", NodeOp::Act(ActOp::Filter))
            .with_input("key", "string", json!("side"))
            .with_input("equals", "string", json!("buy"));
        assert_eq!(node.input("equals").unwrap().value, json!("buy"));
        assert!(node.input("missing").is_none());
        node.input_mut("key").unwrap().value = json!("pair");
        assert_eq!(node.input("key").unwrap().value, json!("pair"));
    }
}

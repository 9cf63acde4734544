//! Source handlers: synthesize data from local configuration only.

use serde_json::{json, Value};

use wireflow_types::Result;

use crate::node::{Node, SourceOp};

use super::{render, value_input, HandlerOutput};

pub(super) fn run(
    op: SourceOp,
    node: &Node,
    inputs: &serde_json::Map<String, Value>,
) -> Result<HandlerOutput> {
    match op {
        SourceOp::Placeholder => Ok(placeholder(inputs)),
        SourceOp::InboundMessage => Ok(inbound_message(node, inputs)),
    }
}

/// Echo the configured value.
fn placeholder(inputs: &serde_json::Map<String, Value>) -> HandlerOutput {
    let value = value_input(inputs);
    let line = format!("emitting {}", render(&value));
    HandlerOutput::default().with("value", value).log(line)
}

/// Fabricate a structured inbound chat message from the configured fields.
fn inbound_message(node: &Node, inputs: &serde_json::Map<String, Value>) -> HandlerOutput {
    let text = inputs
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("hello")
        .to_string();
    let sender = inputs
        .get("sender")
        .and_then(Value::as_str)
        .unwrap_or("user")
        .to_string();
    let chat_id = inputs
        .get("chatId")
        .and_then(Value::as_str)
        .unwrap_or("chat-1")
        .to_string();

    let message = json!({
        "chatId": chat_id,
        "sender": sender,
        "text": text,
        "receivedVia": node.id,
    });
    HandlerOutput::default()
        .with("message", message)
        .with("text", Value::String(text.clone()))
        .log(format!("inbound message from {sender}: {text}"))
}

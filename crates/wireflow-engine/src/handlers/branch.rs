//! Branch handler: evaluate the condition expression against the resolved
//! value. Never fails; unparseable conditions route to the false output.

use serde_json::{Map, Value};

use crate::expr;
use crate::node::BranchOp;

use super::{value_input, HandlerOutput};

pub(super) fn run(op: BranchOp, inputs: &Map<String, Value>) -> HandlerOutput {
    match op {
        BranchOp::Condition => condition(inputs),
    }
}

fn condition(inputs: &Map<String, Value>) -> HandlerOutput {
    let raw = inputs
        .get("condition")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let value = value_input(inputs);

    let verdict = expr::evaluate(&expr::parse(&raw), &value);

    HandlerOutput::default()
        .with("true", Value::Bool(verdict))
        .with("false", Value::Bool(!verdict))
        .with(
            "debug",
            Value::String(format!("{raw:?} with {value} => {verdict}")),
        )
        .log(format!("condition {raw:?} evaluated to {verdict}"))
}

//! Sink handler: terminal display. Output is display-oriented only and is
//! never propagated (the propagator refuses edges out of sinks).

use serde_json::{Map, Value};

use crate::node::SinkOp;

use super::{render, value_input, HandlerOutput};

pub(super) fn run(op: SinkOp, inputs: &Map<String, Value>) -> HandlerOutput {
    match op {
        SinkOp::Display => display(inputs),
    }
}

fn display(inputs: &Map<String, Value>) -> HandlerOutput {
    let value = value_input(inputs);
    let rendered = render(&value);
    HandlerOutput::default()
        .with("display", Value::String(rendered.clone()))
        .log(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(value: Value) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("value".into(), value);
        map
    }

    #[test]
    fn display_renders_strings_verbatim() {
        let out = display(&inputs(json!("hello")));
        assert_eq!(out.data["display"], json!("hello"));
        assert_eq!(out.logs, vec!["hello".to_string()]);
    }

    #[test]
    fn display_renders_structures_as_json() {
        let out = display(&inputs(json!({"k": 1})));
        assert_eq!(out.data["display"], json!("{\"k\":1}"));
    }

    #[test]
    fn display_of_null_is_empty() {
        let out = display(&inputs(json!(null)));
        assert_eq!(out.data["display"], json!(""));
    }
}

//! Act handlers: simulated external calls, data transforms, and the
//! messaging notifiers.

use serde_json::{json, Map, Value};

use wireflow_bots::SendOptions;
use wireflow_types::{FlowError, Result};

use crate::node::{ActOp, Node};

use super::{render, transform, value_input, CapabilityContext, HandlerOutput,
    EXTERNAL_CALL_DELAY_MS};

pub(super) async fn run(
    op: ActOp,
    node: &Node,
    inputs: &Map<String, Value>,
    caps: &CapabilityContext,
) -> Result<HandlerOutput> {
    match op {
        ActOp::HttpRequest => http_request(inputs).await,
        ActOp::Generate => transform::generate(inputs, caps).await,
        ActOp::Flatten => Ok(flatten(inputs)),
        ActOp::Uppercase => Ok(recase(inputs, true)),
        ActOp::Lowercase => Ok(recase(inputs, false)),
        ActOp::Filter => Ok(filter(inputs)),
        ActOp::AddMetadata => Ok(add_metadata(node, inputs)),
        ActOp::NotifyTelegram => notify(node, inputs, caps, "telegram").await,
        ActOp::NotifyDiscord => notify(node, inputs, caps, "discord").await,
    }
}

// ---------------------------------------------------------------------------
// http_request — simulated call, deterministic per input pattern
// ---------------------------------------------------------------------------

async fn http_request(inputs: &Map<String, Value>) -> Result<HandlerOutput> {
    let url = inputs
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let method = inputs
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("GET")
        .to_uppercase();

    tokio::time::sleep(std::time::Duration::from_millis(EXTERNAL_CALL_DELAY_MS)).await;

    // No real I/O: failure modes are triggered by the URL itself so graphs
    // can exercise the error path deterministically.
    if url.contains("timeout") {
        return Err(FlowError::ProviderTimeout {
            provider: "http".into(),
            timeout_ms: EXTERNAL_CALL_DELAY_MS,
        });
    }
    if url.contains("500") {
        return Err(FlowError::ProviderHttp {
            provider: "http".into(),
            status: 500,
            message: format!("{method} {url} returned internal server error"),
        });
    }

    let body = json!({
        "url": url,
        "method": method,
        "echo": value_input(inputs),
    });
    Ok(HandlerOutput::default()
        .with("status", json!(200))
        .with("body", body)
        .log(format!("{method} {url} -> 200")))
}

// ---------------------------------------------------------------------------
// Pure data transforms
// ---------------------------------------------------------------------------

/// Collapse nested objects into dotted keys; arrays and scalars pass
/// through untouched.
fn flatten(inputs: &Map<String, Value>) -> HandlerOutput {
    let value = value_input(inputs);
    let flattened = match &value {
        Value::Object(map) => {
            let mut flat = Map::new();
            flatten_into(&mut flat, "", map);
            Value::Object(flat)
        }
        other => other.clone(),
    };
    HandlerOutput::default()
        .with("value", flattened)
        .log("flattened payload".to_string())
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(flat, &path, inner),
            other => {
                flat.insert(path, other.clone());
            }
        }
    }
}

fn recase(inputs: &Map<String, Value>, upper: bool) -> HandlerOutput {
    let text = render(&value_input(inputs));
    let cased = if upper {
        text.to_uppercase()
    } else {
        text.to_lowercase()
    };
    HandlerOutput::default()
        .with("value", Value::String(cased))
        .log(if upper { "uppercased" } else { "lowercased" })
}

/// Keep array elements whose `key` field equals the configured value.
/// Non-array inputs pass or drop as a single element.
fn filter(inputs: &Map<String, Value>) -> HandlerOutput {
    let value = value_input(inputs);
    let key = inputs.get("key").and_then(Value::as_str).unwrap_or("");
    let wanted = inputs.get("equals").cloned().unwrap_or(Value::Null);

    let matches = |item: &Value| -> bool {
        if key.is_empty() {
            return loosely_equal(item, &wanted);
        }
        item.get(key).map(|v| loosely_equal(v, &wanted)).unwrap_or(false)
    };

    let (filtered, kept, total) = match value {
        Value::Array(items) => {
            let total = items.len();
            let kept: Vec<Value> = items.into_iter().filter(|i| matches(i)).collect();
            let n = kept.len();
            (Value::Array(kept), n, total)
        }
        other => {
            if matches(&other) {
                (other, 1, 1)
            } else {
                (Value::Null, 0, 1)
            }
        }
    };

    HandlerOutput::default()
        .with("value", filtered)
        .log(format!("kept {kept} of {total}"))
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    render(a) == render(b)
}

/// Wrap the payload with provenance metadata.
fn add_metadata(node: &Node, inputs: &Map<String, Value>) -> HandlerOutput {
    let value = value_input(inputs);
    let annotated = json!({
        "payload": value,
        "meta": {
            "annotatedBy": node.id,
            "annotatedAt": chrono::Utc::now().to_rfc3339(),
        },
    });
    HandlerOutput::default()
        .with("value", annotated)
        .log("attached metadata")
}

// ---------------------------------------------------------------------------
// Messaging notifiers
// ---------------------------------------------------------------------------

async fn notify(
    node: &Node,
    inputs: &Map<String, Value>,
    caps: &CapabilityContext,
    service: &str,
) -> Result<HandlerOutput> {
    let messenger = caps
        .messenger(service)
        .ok_or_else(|| FlowError::ProviderUnconfigured {
            provider: service.to_string(),
        })?;

    let payload = value_input(inputs);
    let text = format_notification(&payload);
    let target = inputs
        .get("target")
        .and_then(Value::as_str)
        .unwrap_or("default")
        .to_string();

    tokio::time::sleep(std::time::Duration::from_millis(EXTERNAL_CALL_DELAY_MS)).await;
    let receipt = messenger
        .send_message(&target, &text, &SendOptions::default())
        .await?;

    if !receipt.ok {
        return Err(FlowError::Bot {
            service: service.to_string(),
            message: receipt
                .error_description
                .unwrap_or_else(|| "send rejected".into()),
        });
    }

    tracing::info!(node = %node.id, service, target, "notification delivered");
    // Pass the upstream payload through unchanged so further downstream
    // nodes still see it.
    Ok(HandlerOutput::default()
        .with("value", payload)
        .with(
            "delivery",
            json!({
                "service": service,
                "target": target,
                "messageId": receipt.message_id,
            }),
        )
        .log(format!("sent {service} message to {target}: {text}")))
}

/// Render the upstream payload as human-readable chat text. Wallet info,
/// recommendations, and trade details get dedicated shapes; everything else
/// is rendered as-is.
fn format_notification(payload: &Value) -> String {
    if let Some(wallet) = payload.get("wallet") {
        let address = wallet
            .get("address")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let balance = wallet.get("balance").map(render).unwrap_or_default();
        return format!("Wallet {address}: balance {balance}");
    }
    if let Some(rec) = payload.get("recommendation") {
        return format!("Recommendation: {}", render(rec));
    }
    if let Some(trade) = payload.get("trade") {
        let side = trade.get("side").and_then(Value::as_str).unwrap_or("?");
        let pair = trade.get("pair").and_then(Value::as_str).unwrap_or("?");
        let amount = trade.get("amount").map(render).unwrap_or_default();
        return format!("Trade executed: {side} {amount} {pair}");
    }
    render(payload)
}

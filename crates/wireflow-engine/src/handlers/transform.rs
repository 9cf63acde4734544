//! Transform handlers: text generation over the resolved input.

use serde_json::{json, Value};

use wireflow_gen::GenerateOptions;
use wireflow_types::Result;

use crate::node::TransformOp;

use super::{render, value_input, CapabilityContext, HandlerOutput, EXTERNAL_CALL_DELAY_MS};

pub(super) async fn run(
    op: TransformOp,
    inputs: &serde_json::Map<String, Value>,
    caps: &CapabilityContext,
) -> Result<HandlerOutput> {
    match op {
        TransformOp::Generate => generate(inputs, caps).await,
    }
}

/// Generation shared by the transform and act variants: build the prompt
/// from the resolved value (or an explicit `prompt` slot), pick a provider
/// by model name, fall back to the deterministic simulation provider when
/// the named one is not configured.
pub(super) async fn generate(
    inputs: &serde_json::Map<String, Value>,
    caps: &CapabilityContext,
) -> Result<HandlerOutput> {
    let prompt = inputs
        .get("prompt")
        .map(render)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| render(&value_input(inputs)));

    let options = GenerateOptions {
        model: inputs
            .get("model")
            .and_then(Value::as_str)
            .map(str::to_string),
        temperature: inputs
            .get("temperature")
            .and_then(Value::as_f64)
            .map(|t| t as f32),
        max_tokens: inputs
            .get("maxTokens")
            .and_then(Value::as_u64)
            .map(|n| n as u32),
        timeout_ms: inputs.get("timeoutMs").and_then(Value::as_u64),
    };

    tokio::time::sleep(std::time::Duration::from_millis(EXTERNAL_CALL_DELAY_MS)).await;
    let (generation, fallback_used) = caps
        .generators
        .generate_or_fallback(&prompt, &options)
        .await?;

    let mut out = HandlerOutput::default()
        .with("output", Value::String(generation.text.clone()))
        .with("model", Value::String(generation.model.clone()))
        .with(
            "tokenUsage",
            json!({
                "prompt": generation.token_usage.prompt,
                "completion": generation.token_usage.completion,
                "total": generation.token_usage.total,
            }),
        )
        .with("fallbackUsed", Value::Bool(fallback_used));
    out = out.log(format!(
        "generated {} tokens with {}{}",
        generation.token_usage.completion,
        generation.model,
        if fallback_used {
            " (simulation fallback)"
        } else {
            ""
        },
    ));
    Ok(out)
}

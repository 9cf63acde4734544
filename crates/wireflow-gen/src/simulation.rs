//! The always-available deterministic provider.
//!
//! Produces a stable response derived only from the prompt text, so graphs
//! can be executed and re-executed without any external credentials and
//! tests can assert on exact output.

use async_trait::async_trait;

use crate::{GenerateOptions, Generation, GenerationProvider, TokenUsage};

const SIMULATED_LATENCY_MS: u64 = 80;

pub struct SimulationProvider;

impl SimulationProvider {
    fn compose(prompt: &str) -> String {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return "Nothing to respond to: the prompt was empty.".to_string();
        }

        let lower = trimmed.to_lowercase();
        if lower.contains("recommend") || lower.contains("should i") {
            format!(
                "Recommendation: hold steady. Reasoning (simulated): the request \
                 \"{}\" does not indicate urgency, so no action is advised.",
                first_words(trimmed, 12)
            )
        } else if lower.contains("summarize") || lower.contains("summary") {
            format!("Summary (simulated): {}", first_words(trimmed, 18))
        } else {
            format!("Simulated response to: {}", first_words(trimmed, 24))
        }
    }
}

fn first_words(text: &str, n: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().take(n).collect();
    let mut out = words.join(" ");
    if text.split_whitespace().count() > n {
        out.push('…');
    }
    out
}

#[async_trait]
impl GenerationProvider for SimulationProvider {
    fn name(&self) -> &str {
        "simulation"
    }

    fn default_model(&self) -> &str {
        "simulation-1"
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> wireflow_types::Result<Generation> {
        // Models the suspension point of a real network call.
        tokio::time::sleep(std::time::Duration::from_millis(SIMULATED_LATENCY_MS)).await;

        let mut text = Self::compose(prompt);
        if let Some(max) = options.max_tokens {
            text = first_words(&text, max as usize);
        }

        let prompt_tokens = prompt.split_whitespace().count() as u32;
        let completion_tokens = text.split_whitespace().count() as u32;

        Ok(Generation {
            token_usage: TokenUsage::new(prompt_tokens, completion_tokens),
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.default_model().to_string()),
            text,
            created_at: chrono::Utc::now(),
        })
    }
}

//! Provider registry and model-name resolution.

use std::collections::HashMap;

use wireflow_types::FlowError;

use crate::{DynGenerator, GenerateOptions, Generation, GenerationProvider, SimulationProvider};

/// Name of the provider that is always present and never fails.
pub const FALLBACK_PROVIDER: &str = "simulation";

/// Map a configured model string to a provider name.
///
/// This is a substring heuristic over the model id, matching how node
/// configurations name models ("gpt-4o", "claude-sonnet", ...). Anything
/// unrecognized resolves to the simulation fallback.
pub fn provider_for_model(model: &str) -> &'static str {
    let lower = model.to_ascii_lowercase();
    if lower.contains("gpt") || lower.starts_with('o') {
        "openai"
    } else if lower.contains("claude") {
        "anthropic"
    } else if lower.contains("gemini") {
        "google"
    } else {
        FALLBACK_PROVIDER
    }
}

// ---------------------------------------------------------------------------
// GeneratorRegistry
// ---------------------------------------------------------------------------

pub struct GeneratorRegistry {
    providers: HashMap<String, DynGenerator>,
}

impl GeneratorRegistry {
    /// Create a registry pre-loaded with the simulation provider.
    pub fn new() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            FALLBACK_PROVIDER.to_string(),
            DynGenerator::new(SimulationProvider),
        );
        Self { providers }
    }

    pub fn register(&mut self, provider: impl GenerationProvider + 'static) {
        let name = provider.name().to_string();
        self.providers.insert(name, DynGenerator::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&DynGenerator> {
        self.providers.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Generate with the provider the model string resolves to, falling back
    /// to the simulation provider when that provider is not registered.
    ///
    /// Returns the generation plus a flag that is `true` when the fallback
    /// produced the result. Errors from a *configured* provider are real
    /// failures and are not silently downgraded to the fallback.
    pub async fn generate_or_fallback(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> wireflow_types::Result<(Generation, bool)> {
        let wanted = options
            .model
            .as_deref()
            .map(provider_for_model)
            .unwrap_or(FALLBACK_PROVIDER);

        let (provider, fallback_used) = match self.providers.get(wanted) {
            Some(p) => (p, wanted == FALLBACK_PROVIDER),
            None => {
                tracing::debug!(
                    wanted,
                    "provider not registered, using simulation fallback"
                );
                let fallback = self
                    .providers
                    .get(FALLBACK_PROVIDER)
                    .ok_or_else(|| FlowError::ProviderUnconfigured {
                        provider: FALLBACK_PROVIDER.into(),
                    })?;
                (fallback, true)
            }
        };

        let generation = match options.timeout_ms {
            Some(timeout_ms) => {
                let budget = std::time::Duration::from_millis(timeout_ms);
                tokio::time::timeout(budget, provider.generate(prompt, options))
                    .await
                    .map_err(|_| FlowError::ProviderTimeout {
                        provider: provider.name().to_string(),
                        timeout_ms,
                    })??
            }
            None => provider.generate(prompt, options).await?,
        };

        Ok((generation, fallback_used))
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

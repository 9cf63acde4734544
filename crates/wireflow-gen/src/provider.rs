use async_trait::async_trait;

use crate::{GenerateOptions, Generation};

// ---------------------------------------------------------------------------
// GenerationProvider
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Registry name of this provider (e.g. "simulation", "openai").
    fn name(&self) -> &str;

    /// Model used when the request does not name one.
    fn default_model(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> wireflow_types::Result<Generation>;
}

// ---------------------------------------------------------------------------
// DynGenerator
// ---------------------------------------------------------------------------

pub struct DynGenerator(Box<dyn GenerationProvider>);

impl DynGenerator {
    pub fn new(provider: impl GenerationProvider + 'static) -> Self {
        Self(Box::new(provider))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn default_model(&self) -> &str {
        self.0.default_model()
    }

    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> wireflow_types::Result<Generation> {
        self.0.generate(prompt, options).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

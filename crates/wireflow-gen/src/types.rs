use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GenerateOptions
// ---------------------------------------------------------------------------

/// Tuning options passed alongside a prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// TokenUsage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

impl TokenUsage {
    pub fn new(prompt: u32, completion: u32) -> Self {
        Self {
            prompt,
            completion,
            total: prompt + completion,
        }
    }
}

// ---------------------------------------------------------------------------
// Generation — a completed text-generation result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub token_usage: TokenUsage,
    pub model: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_totals() {
        let usage = TokenUsage::new(12, 30);
        assert_eq!(usage.prompt, 12);
        assert_eq!(usage.completion, 30);
        assert_eq!(usage.total, 42);
    }

    #[test]
    fn generation_serde_round_trip() {
        let gen = Generation {
            text: "hello".into(),
            token_usage: TokenUsage::new(1, 2),
            model: "simulation".into(),
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&gen).unwrap();
        let back: Generation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.text, "hello");
        assert_eq!(back.token_usage.total, 3);
        assert_eq!(back.model, "simulation");
    }

    #[test]
    fn options_default_is_empty() {
        let opts = GenerateOptions::default();
        assert!(opts.model.is_none());
        assert!(opts.temperature.is_none());
        assert!(opts.max_tokens.is_none());
        assert!(opts.timeout_ms.is_none());
    }
}

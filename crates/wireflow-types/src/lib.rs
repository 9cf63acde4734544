//! Shared types and errors for the Wireflow graph engine.
//!
//! This crate provides the foundational types used across all other Wireflow
//! crates:
//! - `FlowError` — unified error taxonomy
//! - `ExecutionStatus` — per-node run status
//! - `ConsoleLine` — timestamped node log entry

use serde::{Deserialize, Serialize};

/// Unified error type for all Wireflow subsystems.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    // === Capability (provider) errors ===
    #[error("Provider '{provider}' is not configured")]
    ProviderUnconfigured { provider: String },

    #[error("Provider '{provider}' timed out after {timeout_ms}ms")]
    ProviderTimeout { provider: String, timeout_ms: u64 },

    #[error("Provider '{provider}' returned HTTP {status}: {message}")]
    ProviderHttp {
        provider: String,
        status: u16,
        message: String,
    },

    // === Messaging errors ===
    #[error("Messenger '{service}' error: {message}")]
    Bot { service: String, message: String },

    // === Graph errors ===
    #[error("Node '{id}' not found")]
    NodeNotFound { id: String },

    #[error("Graph integrity violation: {0}")]
    GraphIntegrity(String),

    // === Handler errors ===
    #[error("Invalid input: {0}")]
    Validation(String),

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl FlowError {
    /// Returns `true` if the error originated in an external capability
    /// (generation or messaging) rather than in the engine itself.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            FlowError::ProviderUnconfigured { .. }
                | FlowError::ProviderTimeout { .. }
                | FlowError::ProviderHttp { .. }
                | FlowError::Bot { .. }
        )
    }
}

/// A convenience alias for `Result<T, FlowError>`.
pub type Result<T> = std::result::Result<T, FlowError>;

// ---------------------------------------------------------------------------
// ExecutionStatus — result status of a node's most recent run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The node has not run since creation or snapshot load.
    #[default]
    None,
    Success,
    Error,
}

// ---------------------------------------------------------------------------
// ConsoleLine — timestamped per-node log entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLine {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub message: String,
}

impl ConsoleLine {
    /// Create a line stamped with the current time.
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.message
        )
    }
}

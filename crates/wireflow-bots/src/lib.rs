//! Messaging-bot capability consumed by the notify node handlers.
//!
//! The engine calls messengers through the narrow [`Messenger`] trait and
//! never implements a wire protocol itself. Two integrations with the same
//! shape are provided ([`telegram::TelegramCourier`],
//! [`discord::DiscordCourier`]); both normalize their service's raw inbound
//! update format into [`InboundEvent`] and record outbound sends on an
//! in-memory transport.

pub mod discord;
pub mod telegram;

pub use discord::DiscordCourier;
pub use telegram::TelegramCourier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Messenger trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Service identifier (e.g. "telegram", "discord").
    fn service(&self) -> &str;

    async fn send_message(
        &self,
        target: &str,
        text: &str,
        options: &SendOptions,
    ) -> wireflow_types::Result<SendReceipt>;

    async fn register_webhook(&self, url: &str) -> wireflow_types::Result<()>;

    async fn remove_webhook(&self) -> wireflow_types::Result<()>;

    /// Normalize a raw inbound update into an [`InboundEvent`].
    ///
    /// Returns `None` for updates this service cannot interpret (wrong
    /// shape, non-message update types).
    fn process_inbound_update(&self, raw: &serde_json::Value) -> Option<InboundEvent>;
}

// ---------------------------------------------------------------------------
// Send types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendOptions {
    /// Deliver without a notification ping.
    pub silent: bool,
    /// Service-specific formatting hint ("Markdown", "HTML", ...).
    pub parse_mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub ok: bool,
    pub message_id: Option<String>,
    pub error_description: Option<String>,
}

impl SendReceipt {
    pub fn delivered(message_id: impl Into<String>) -> Self {
        Self {
            ok: true,
            message_id: Some(message_id.into()),
            error_description: None,
        }
    }

    pub fn rejected(description: impl Into<String>) -> Self {
        Self {
            ok: false,
            message_id: None,
            error_description: Some(description.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// InboundEvent — normalized inbound update
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundEventType {
    Message,
    Command,
    EditedMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub event_type: InboundEventType,
    pub chat_id: String,
    pub text: String,
    pub sender: Option<String>,
}

// ---------------------------------------------------------------------------
// RecordingMessenger — in-memory messenger for tests and offline play
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub target: String,
    pub text: String,
    pub silent: bool,
}

/// A messenger that always delivers and remembers every send.
pub struct RecordingMessenger {
    service: String,
    outbox: std::sync::Mutex<Vec<SentMessage>>,
    webhook: std::sync::Mutex<Option<String>>,
}

impl RecordingMessenger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            outbox: std::sync::Mutex::new(Vec::new()),
            webhook: std::sync::Mutex::new(None),
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.outbox.lock().expect("outbox poisoned").clone()
    }

    pub fn webhook_url(&self) -> Option<String> {
        self.webhook.lock().expect("webhook poisoned").clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    fn service(&self) -> &str {
        &self.service
    }

    async fn send_message(
        &self,
        target: &str,
        text: &str,
        options: &SendOptions,
    ) -> wireflow_types::Result<SendReceipt> {
        let mut outbox = self.outbox.lock().expect("outbox poisoned");
        outbox.push(SentMessage {
            target: target.to_string(),
            text: text.to_string(),
            silent: options.silent,
        });
        Ok(SendReceipt::delivered(format!("rec-{}", outbox.len())))
    }

    async fn register_webhook(&self, url: &str) -> wireflow_types::Result<()> {
        *self.webhook.lock().expect("webhook poisoned") = Some(url.to_string());
        Ok(())
    }

    async fn remove_webhook(&self) -> wireflow_types::Result<()> {
        *self.webhook.lock().expect("webhook poisoned") = None;
        Ok(())
    }

    fn process_inbound_update(&self, raw: &serde_json::Value) -> Option<InboundEvent> {
        // Accepts the already-normalized shape, for test fixtures.
        serde_json::from_value(raw.clone()).ok()
    }
}

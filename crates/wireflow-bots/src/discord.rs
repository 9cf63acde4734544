//! Discord-shaped courier.
//!
//! Same capability shape as the Telegram courier, normalizing gateway
//! `MESSAGE_CREATE` dispatch payloads instead of Bot API updates.

use async_trait::async_trait;

use wireflow_types::FlowError;

use crate::{
    InboundEvent, InboundEventType, Messenger, SendOptions, SendReceipt, SentMessage,
};

pub struct DiscordCourier {
    bot_token: Option<String>,
    outbox: std::sync::Mutex<Vec<SentMessage>>,
    webhook: std::sync::Mutex<Option<String>>,
}

impl DiscordCourier {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: Some(bot_token.into()),
            outbox: std::sync::Mutex::new(Vec::new()),
            webhook: std::sync::Mutex::new(None),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            bot_token: None,
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

    fn require_token(&self) -> wireflow_types::Result<&str> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| FlowError::ProviderUnconfigured {
                provider: "discord".into(),
            })
    }
}

const MAX_CONTENT_LEN: usize = 2000;

#[async_trait]
impl Messenger for DiscordCourier {
    fn service(&self) -> &str {
        "discord"
    }

    async fn send_message(
        &self,
        target: &str,
        text: &str,
        options: &SendOptions,
    ) -> wireflow_types::Result<SendReceipt> {
        self.require_token()?;

        if target.is_empty() {
            return Ok(SendReceipt::rejected("Unknown Channel"));
        }
        if text.is_empty() {
            return Ok(SendReceipt::rejected("Cannot send an empty message"));
        }
        if text.chars().count() > MAX_CONTENT_LEN {
            return Ok(SendReceipt::rejected(format!(
                "Must be {MAX_CONTENT_LEN} or fewer in length"
            )));
        }

        let mut outbox = self.outbox.lock().expect("outbox poisoned");
        outbox.push(SentMessage {
            target: target.to_string(),
            text: text.to_string(),
            silent: options.silent,
        });
        tracing::debug!(channel = target, chars = text.len(), "discord message queued");
        Ok(SendReceipt::delivered(format!("dc-{}", outbox.len())))
    }

    async fn register_webhook(&self, url: &str) -> wireflow_types::Result<()> {
        self.require_token()?;
        if !url.starts_with("https://") {
            return Err(FlowError::Bot {
                service: "discord".into(),
                message: "webhook url must be https".into(),
            });
        }
        *self.webhook.lock().expect("webhook poisoned") = Some(url.to_string());
        Ok(())
    }

    async fn remove_webhook(&self) -> wireflow_types::Result<()> {
        self.require_token()?;
        *self.webhook.lock().expect("webhook poisoned") = None;
        Ok(())
    }

    fn process_inbound_update(&self, raw: &serde_json::Value) -> Option<InboundEvent> {
        // Gateway dispatch shape: { "t": "MESSAGE_CREATE", "d": {
        // "channel_id": s, "content": s, "author": {"username": s} } }
        let event_type = match raw.get("t")?.as_str()? {
            "MESSAGE_CREATE" => None,
            "MESSAGE_UPDATE" => Some(InboundEventType::EditedMessage),
            _ => return None,
        };

        let data = raw.get("d")?;
        let chat_id = data.get("channel_id")?.as_str()?.to_string();
        let text = data.get("content")?.as_str()?.to_string();
        if text.is_empty() {
            return None;
        }
        let sender = data
            .get("author")
            .and_then(|a| a.get("username"))
            .and_then(|u| u.as_str())
            .map(String::from);

        let event_type = event_type.unwrap_or(if text.starts_with('!') {
            InboundEventType::Command
        } else {
            InboundEventType::Message
        });

        Some(InboundEvent {
            event_type,
            chat_id,
            text,
            sender,
        })
    }
}

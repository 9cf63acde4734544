//! Telegram-shaped courier.
//!
//! Normalizes Bot API update objects (`update_id` + `message`/
//! `edited_message`) and delivers through an in-memory transport. The real
//! HTTP client lives outside this crate; a courier without a token behaves
//! exactly like an unconfigured integration.

use async_trait::async_trait;

use wireflow_types::FlowError;

use crate::{
    InboundEvent, InboundEventType, Messenger, SendOptions, SendReceipt, SentMessage,
};

pub struct TelegramCourier {
    token: Option<String>,
    outbox: std::sync::Mutex<Vec<SentMessage>>,
    webhook: std::sync::Mutex<Option<String>>,
}

impl TelegramCourier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            outbox: std::sync::Mutex::new(Vec::new()),
            webhook: std::sync::Mutex::new(None),
        }
    }

    /// A courier with no bot token. Every send fails with
    /// `ProviderUnconfigured`.
    pub fn unconfigured() -> Self {
        Self {
            token: None,
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
        self.token
            .as_deref()
            .ok_or_else(|| FlowError::ProviderUnconfigured {
                provider: "telegram".into(),
            })
    }
}

#[async_trait]
impl Messenger for TelegramCourier {
    fn service(&self) -> &str {
        "telegram"
    }

    async fn send_message(
        &self,
        target: &str,
        text: &str,
        options: &SendOptions,
    ) -> wireflow_types::Result<SendReceipt> {
        self.require_token()?;

        if target.is_empty() {
            return Ok(SendReceipt::rejected("Bad Request: chat_id is empty"));
        }
        if text.is_empty() {
            return Ok(SendReceipt::rejected("Bad Request: message text is empty"));
        }

        let mut outbox = self.outbox.lock().expect("outbox poisoned");
        outbox.push(SentMessage {
            target: target.to_string(),
            text: text.to_string(),
            silent: options.silent,
        });
        tracing::debug!(target, chars = text.len(), "telegram message queued");
        Ok(SendReceipt::delivered(format!("tg-{}", outbox.len())))
    }

    async fn register_webhook(&self, url: &str) -> wireflow_types::Result<()> {
        self.require_token()?;
        if !url.starts_with("https://") {
            return Err(FlowError::Bot {
                service: "telegram".into(),
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
        // Bot API shape: { "update_id": n, "message": { "chat": {"id": n},
        // "text": s, "from": {"username": s} } }
        let (message, event_type) = if let Some(m) = raw.get("message") {
            (m, None)
        } else if let Some(m) = raw.get("edited_message") {
            (m, Some(InboundEventType::EditedMessage))
        } else {
            return None;
        };

        let chat_id = message.get("chat")?.get("id")?;
        let chat_id = match chat_id {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s.clone(),
            _ => return None,
        };
        let text = message.get("text")?.as_str()?.to_string();
        let sender = message
            .get("from")
            .and_then(|f| f.get("username"))
            .and_then(|u| u.as_str())
            .map(String::from);

        let event_type = event_type.unwrap_or(if text.starts_with('/') {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn send_records_to_outbox() {
        let courier = TelegramCourier::new("123:abc");
        let receipt = courier
            .send_message("555", "wallet funded", &SendOptions::default())
            .await
            .unwrap();
        assert!(receipt.ok);
        assert_eq!(courier.sent().len(), 1);
        assert_eq!(courier.sent()[0].target, "555");
    }

    #[tokio::test]
    async fn unconfigured_courier_fails_sends() {
        let courier = TelegramCourier::unconfigured();
        let err = courier
            .send_message("555", "hi", &SendOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::ProviderUnconfigured { .. }));
    }

    #[tokio::test]
    async fn empty_chat_id_is_rejected_not_an_error() {
        let courier = TelegramCourier::new("123:abc");
        let receipt = courier
            .send_message("", "hi", &SendOptions::default())
            .await
            .unwrap();
        assert!(!receipt.ok);
        assert!(receipt.error_description.unwrap().contains("chat_id"));
    }

    #[tokio::test]
    async fn webhook_requires_https() {
        let courier = TelegramCourier::new("123:abc");
        assert!(courier
            .register_webhook("http://insecure.test")
            .await
            .is_err());
        courier
            .register_webhook("https://example.test/hook")
            .await
            .unwrap();
        assert_eq!(
            courier.webhook_url().as_deref(),
            Some("https://example.test/hook")
        );
        courier.remove_webhook().await.unwrap();
        assert!(courier.webhook_url().is_none());
    }

    #[test]
    fn normalizes_plain_message() {
        let courier = TelegramCourier::new("123:abc");
        let raw = json!({
            "update_id": 1001,
            "message": {
                "chat": {"id": 42},
                "text": "price check",
                "from": {"username": "alice"}
            }
        });
        let event = courier.process_inbound_update(&raw).unwrap();
        assert_eq!(event.event_type, InboundEventType::Message);
        assert_eq!(event.chat_id, "42");
        assert_eq!(event.text, "price check");
        assert_eq!(event.sender.as_deref(), Some("alice"));
    }

    #[test]
    fn slash_text_is_a_command() {
        let courier = TelegramCourier::new("123:abc");
        let raw = json!({
            "update_id": 1002,
            "message": {"chat": {"id": 42}, "text": "/balance"}
        });
        let event = courier.process_inbound_update(&raw).unwrap();
        assert_eq!(event.event_type, InboundEventType::Command);
        assert!(event.sender.is_none());
    }

    #[test]
    fn edited_message_keeps_its_type() {
        let courier = TelegramCourier::new("123:abc");
        let raw = json!({
            "update_id": 1003,
            "edited_message": {"chat": {"id": 42}, "text": "/balance"}
        });
        let event = courier.process_inbound_update(&raw).unwrap();
        assert_eq!(event.event_type, InboundEventType::EditedMessage);
    }

    #[test]
    fn non_message_updates_are_ignored() {
        let courier = TelegramCourier::new("123:abc");
        assert!(courier
            .process_inbound_update(&json!({"update_id": 1, "poll": {}}))
            .is_none());
        assert!(courier
            .process_inbound_update(&json!({"update_id": 1, "message": {"chat": {"id": 1}}}))
            .is_none()); // no text
        assert!(courier.process_inbound_update(&json!("not an object")).is_none());
    }
}

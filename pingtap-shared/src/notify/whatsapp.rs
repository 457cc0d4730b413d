//! WhatsApp Business Cloud API client
//!
//! Outbound: `POST {api_base}/{phone_number_id}/messages` with a bearer
//! token. Inbound webhook bodies are parsed by [`parse_inbound`].

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::{Delivery, Notifier, NotifyError};

pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v17.0";
pub const DEFAULT_LANGUAGE: &str = "en_US";

#[derive(Debug, Clone, Default)]
pub struct WhatsAppConfig {
    pub api_base: String,
    pub phone_number_id: Option<String>,
    pub access_token: Option<String>,
}

/// One outbound message
///
/// A template takes precedence over text when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhatsAppMessage {
    /// Recipient number; a bare ten-digit mobile gets the `91` prefix
    pub to: String,
    pub template_name: Option<String>,
    pub language_code: Option<String>,
    pub text: Option<String>,
}

impl WhatsAppMessage {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            text: Some(body.into()),
            ..Default::default()
        }
    }
}

/// International form of a recipient number
pub fn recipient_number(to: &str) -> String {
    let digits: String = to.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("91{digits}")
    } else {
        digits
    }
}

/// Cloud API request body for a message
pub fn build_payload(message: &WhatsAppMessage) -> Result<Value, NotifyError> {
    let to = recipient_number(&message.to);

    if let Some(name) = &message.template_name {
        let code = message.language_code.as_deref().unwrap_or(DEFAULT_LANGUAGE);
        Ok(json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": { "name": name, "language": { "code": code } }
        }))
    } else if let Some(body) = &message.text {
        Ok(json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body }
        }))
    } else {
        Err(NotifyError::EmptyMessage)
    }
}

/// First message of an inbound webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender number as sent by WhatsApp, e.g. `919876543210`
    pub from: String,
    pub text: Option<String>,
}

/// Extracts `entry[0].changes[0].value.messages[0]`
pub fn parse_inbound(body: &Value) -> Option<InboundMessage> {
    let message = body
        .get("entry")?
        .get(0)?
        .get("changes")?
        .get(0)?
        .get("value")?
        .get("messages")?
        .get(0)?;

    Some(InboundMessage {
        from: message.get("from")?.as_str()?.to_string(),
        text: message
            .get("text")
            .and_then(|t| t.get("body"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    http: reqwest::Client,
    config: WhatsAppConfig,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, config })
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            phone_number_id
        )
    }
}

#[async_trait]
impl Notifier for WhatsAppClient {
    async fn send(&self, message: &WhatsAppMessage) -> Result<Delivery, NotifyError> {
        let Some(token) = self.config.access_token.as_deref().filter(|t| !t.is_empty()) else {
            warn!("WhatsApp token not configured, message skipped");
            return Ok(Delivery::Skipped);
        };
        let Some(phone_number_id) = self.config.phone_number_id.as_deref() else {
            warn!("WhatsApp phone number id not configured, message skipped");
            return Ok(Delivery::Skipped);
        };

        let payload = build_payload(message)?;
        debug!(to = %payload["to"], kind = %payload["type"], "Sending WhatsApp message");

        let response = self
            .http
            .post(self.messages_url(phone_number_id))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Delivery::Sent(response.json::<Value>().await?))
    }
}

/// Customer notifications
///
/// Messages go out over WhatsApp. Callers treat delivery as best effort: a
/// failed notification is logged and never fails the request that caused it.

pub mod whatsapp;

use async_trait::async_trait;
use serde_json::Value;

pub use whatsapp::WhatsAppMessage;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Either a template name or text must be provided")]
    EmptyMessage,

    #[error("Messaging request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Messaging API returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Result of a send attempt that did not error
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Provider accepted the message; its response body
    Sent(Value),
    /// Messaging is not configured
    Skipped,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &WhatsAppMessage) -> Result<Delivery, NotifyError>;
}

/// Sends and logs failures instead of returning them
pub async fn send_best_effort(notifier: &dyn Notifier, message: &WhatsAppMessage) {
    if let Err(e) = notifier.send(message).await {
        tracing::warn!(error = %e, "WhatsApp notification failed");
    }
}

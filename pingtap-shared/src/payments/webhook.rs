//! Gateway webhook events
//!
//! Parses the event envelope and applies `payment.captured` /
//! `payment.failed` to the payments table. Signature verification happens
//! before anything here runs (see [`super::signature`]).
//!
//! # Payload
//!
//! ```json
//! {
//!   "event": "payment.captured",
//!   "payload": {
//!     "payment": {
//!       "entity": {
//!         "id": "pay_29QQoUBi66xm2f",
//!         "amount": 79900,
//!         "currency": "INR",
//!         "order_id": "order_9A33XWu170gUtm",
//!         "method": "upi",
//!         "notes": { "userId": "…", "subscriptionId": "…", "paymentId": "…" }
//!       }
//!     }
//!   }
//! }
//! ```

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::payment::{Payment, PaymentStatus, RecordProviderPayment};
use crate::payments::activate_subscription;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: Option<WebhookPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub payment: Option<PaymentEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEnvelope {
    pub entity: PaymentEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    /// Gateway payment id
    pub id: String,

    /// Paise
    pub amount: i64,

    pub currency: String,

    #[serde(default)]
    pub order_id: Option<String>,

    #[serde(default)]
    pub method: Option<String>,

    /// Object when notes were set on the order, `[]` otherwise
    #[serde(default)]
    pub notes: Value,
}

impl PaymentEntity {
    fn note_uuid(&self, key: &str) -> Option<Uuid> {
        self.notes
            .get(key)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.note_uuid("userId")
    }

    pub fn subscription_id(&self) -> Option<Uuid> {
        self.note_uuid("subscriptionId")
    }
}

/// Events this service acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    Captured,
    Failed,
    Other,
}

impl WebhookEvent {
    pub fn parse(raw_body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw_body)
    }

    pub fn kind(&self) -> PaymentEventKind {
        match self.event.as_str() {
            "payment.captured" => PaymentEventKind::Captured,
            "payment.failed" => PaymentEventKind::Failed,
            _ => PaymentEventKind::Other,
        }
    }

    pub fn payment_entity(&self) -> Option<&PaymentEntity> {
        self.payload
            .as_ref()
            .and_then(|p| p.payment.as_ref())
            .map(|p| &p.entity)
    }
}

/// What a webhook did to the payments table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Existing row for the order was updated
    Updated(Uuid),
    /// No row existed; one was recorded from the event
    Recorded(Uuid),
    /// Row exists but the report would downgrade a captured payment
    Unchanged(Uuid),
    /// Nothing to act on (other event, no entity, or no known customer)
    Ignored,
}

/// Applies a verified webhook event
///
/// A captured payment also activates its pending subscription.
pub async fn apply_event(pool: &PgPool, event: &WebhookEvent) -> Result<WebhookOutcome, sqlx::Error> {
    let status = match event.kind() {
        PaymentEventKind::Captured => PaymentStatus::Captured,
        PaymentEventKind::Failed => PaymentStatus::Failed,
        PaymentEventKind::Other => {
            info!(event = %event.event, "Ignoring webhook event");
            return Ok(WebhookOutcome::Ignored);
        }
    };

    let Some(entity) = event.payment_entity() else {
        warn!(event = %event.event, "Webhook event without payment entity");
        return Ok(WebhookOutcome::Ignored);
    };

    info!(
        event = %event.event,
        payment_id = %entity.id,
        order_id = ?entity.order_id,
        user_id = ?entity.user_id(),
        "Processing payment webhook"
    );

    let existing = match entity.order_id.as_deref() {
        Some(order_id) => {
            Payment::apply_provider_update(
                pool,
                order_id,
                status,
                &entity.id,
                entity.method.as_deref(),
            )
            .await?
        }
        None => None,
    };

    let (payment, outcome) = match existing {
        Some(payment) => {
            let id = payment.id;
            (payment, WebhookOutcome::Updated(id))
        }
        None => {
            if let Some(order_id) = entity.order_id.as_deref() {
                if let Some(current) = Payment::find_by_order_id(pool, order_id).await? {
                    warn!(
                        payment_id = %current.id,
                        status = current.status.as_str(),
                        reported = status.as_str(),
                        "Ignoring stale gateway report for settled payment"
                    );
                    return Ok(WebhookOutcome::Unchanged(current.id));
                }
            }

            let Some(user_id) = entity.user_id() else {
                warn!(payment_id = %entity.id, "Webhook payment has no known order or customer");
                return Ok(WebhookOutcome::Ignored);
            };

            let recorded = Payment::record_from_provider(
                pool,
                RecordProviderPayment {
                    user_id,
                    subscription_id: entity.subscription_id(),
                    amount: entity.amount,
                    currency: entity.currency.clone(),
                    status,
                    provider_order_id: entity.order_id.clone(),
                    provider_payment_id: entity.id.clone(),
                    method: entity.method.clone(),
                },
            )
            .await;

            // Unknown customer or subscription in the notes; retrying will not help
            let payment = match recorded {
                Ok(payment) => payment,
                Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                    warn!(
                        payment_id = %entity.id,
                        %user_id,
                        error = %e,
                        "Webhook notes reference an unknown customer or subscription"
                    );
                    return Ok(WebhookOutcome::Ignored);
                }
                Err(e) => return Err(e),
            };
            let id = payment.id;
            (payment, WebhookOutcome::Recorded(id))
        }
    };

    if status == PaymentStatus::Captured {
        if let Some(subscription_id) = payment.subscription_id {
            activate_subscription(pool, subscription_id, Utc::now()).await?;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn captured_body(notes: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "entity": "event",
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_29QQoUBi66xm2f",
                        "amount": 79900,
                        "currency": "INR",
                        "order_id": "order_9A33XWu170gUtm",
                        "method": "upi",
                        "notes": notes
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_captured_event() {
        let user_id = Uuid::new_v4();
        let body = captured_body(json!({ "userId": user_id.to_string() }));
        let event = WebhookEvent::parse(&body).unwrap();

        assert_eq!(event.kind(), PaymentEventKind::Captured);
        let entity = event.payment_entity().unwrap();
        assert_eq!(entity.amount, 79900);
        assert_eq!(entity.order_id.as_deref(), Some("order_9A33XWu170gUtm"));
        assert_eq!(entity.user_id(), Some(user_id));
        assert_eq!(entity.subscription_id(), None);
    }

    #[test]
    fn test_empty_notes_array() {
        let event = WebhookEvent::parse(&captured_body(json!([]))).unwrap();
        assert_eq!(event.payment_entity().unwrap().user_id(), None);
    }

    #[test]
    fn test_invalid_user_id_note() {
        let event = WebhookEvent::parse(&captured_body(json!({ "userId": "nope" }))).unwrap();
        assert_eq!(event.payment_entity().unwrap().user_id(), None);
    }

    #[test]
    fn test_other_events() {
        let event = WebhookEvent::parse(br#"{"event":"order.paid","payload":{}}"#).unwrap();
        assert_eq!(event.kind(), PaymentEventKind::Other);
        assert!(event.payment_entity().is_none());

        let failed = WebhookEvent::parse(br#"{"event":"payment.failed"}"#).unwrap();
        assert_eq!(failed.kind(), PaymentEventKind::Failed);
    }

    #[test]
    fn test_malformed_body() {
        assert!(WebhookEvent::parse(b"not json").is_err());
    }
}

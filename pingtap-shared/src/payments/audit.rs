//! Structured payment event log
//!
//! Every step of the order flow emits one `tracing` event carrying a
//! `payment_event` field, so payment activity can be filtered out of the
//! request logs. Field names that look like credentials are redacted before
//! anything is written.

use serde_json::{Map, Value};
use std::fmt;

const SENSITIVE_KEYS: [&str; 7] = ["key", "secret", "password", "token", "auth", "cvv", "card"];

pub const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEvent {
    CreateOrderAttempt,
    PaymentDisabled,
    ProviderNotConfigured,
    OrderCreated,
    Error,
}

impl PaymentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentEvent::CreateOrderAttempt => "CREATE_ORDER_ATTEMPT",
            PaymentEvent::PaymentDisabled => "PAYMENT_DISABLED",
            PaymentEvent::ProviderNotConfigured => "PROVIDER_NOT_CONFIGURED",
            PaymentEvent::OrderCreated => "ORDER_CREATED",
            PaymentEvent::Error => "ERROR",
        }
    }
}

impl fmt::Display for PaymentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

/// Redacts sensitive keys, recursing into nested objects and arrays
pub fn sanitize(fields: &Value) -> Value {
    match fields {
        Value::Object(map) => {
            let mut safe = Map::with_capacity(map.len());
            for (key, value) in map {
                let value = if is_sensitive(key) {
                    Value::String(REDACTED.to_string())
                } else {
                    sanitize(value)
                };
                safe.insert(key.clone(), value);
            }
            Value::Object(safe)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}

/// Emits one payment event
///
/// `ERROR` events are logged at error level, everything else at info.
pub fn log_payment_event(event: PaymentEvent, message: &str, fields: Value) {
    let payload = sanitize(&fields);

    match event {
        PaymentEvent::Error => {
            tracing::error!(payment_event = %event, payload = %payload, "{}", message)
        }
        _ => tracing::info!(payment_event = %event, payload = %payload, "{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sensitive_keys_redacted() {
        let safe = sanitize(&json!({
            "userId": "u1",
            "key_secret": "shh",
            "apiKey": "rzp_live",
            "Authorization": "Basic abc",
            "cardNumber": "4111",
            "amount": 79900
        }));

        assert_eq!(safe["userId"], "u1");
        assert_eq!(safe["amount"], 79900);
        assert_eq!(safe["key_secret"], REDACTED);
        assert_eq!(safe["apiKey"], REDACTED);
        assert_eq!(safe["Authorization"], REDACTED);
        assert_eq!(safe["cardNumber"], REDACTED);
    }

    #[test]
    fn test_nested_objects_redacted() {
        let safe = sanitize(&json!({
            "order": { "amount": 100, "token": "t" },
            "attempts": [{ "password": "p", "ok": true }]
        }));

        assert_eq!(safe["order"]["amount"], 100);
        assert_eq!(safe["order"]["token"], REDACTED);
        assert_eq!(safe["attempts"][0]["password"], REDACTED);
        assert_eq!(safe["attempts"][0]["ok"], true);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(PaymentEvent::CreateOrderAttempt.to_string(), "CREATE_ORDER_ATTEMPT");
        assert_eq!(PaymentEvent::ProviderNotConfigured.as_str(), "PROVIDER_NOT_CONFIGURED");
    }
}

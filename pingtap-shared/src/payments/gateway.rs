//! Payment gateway client
//!
//! Orders are created through a Razorpay-compatible REST API
//! (`POST {api_base}/v1/orders`, HTTP basic auth with the key id and key
//! secret, amounts in paise). Handlers talk to the [`PaymentGateway`] trait so
//! tests can substitute a scripted gateway.
//!
//! # Example
//!
//! ```no_run
//! use pingtap_shared::payments::gateway::{
//!     GatewayConfig, OrderNotes, OrderRequest, PaymentGateway, RazorpayClient,
//! };
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = RazorpayClient::new(GatewayConfig {
//!     key_id: Some("rzp_test_123".to_string()),
//!     key_secret: Some("secret".to_string()),
//!     api_base: "https://api.razorpay.com".to_string(),
//! })?;
//!
//! let order = gateway
//!     .create_order(&OrderRequest {
//!         amount: 79_900,
//!         currency: "INR".to_string(),
//!         receipt: "rcpt_1718000000000_9f2c".to_string(),
//!         notes: OrderNotes {
//!             user_id: Uuid::new_v4(),
//!             subscription_id: Uuid::new_v4(),
//!             payment_id: Uuid::new_v4(),
//!         },
//!     })
//!     .await?;
//! println!("order {}", order.id);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Key id or key secret missing
    #[error("Payment gateway is not configured")]
    NotConfigured,

    #[error("Payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Payment gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Credentials and endpoint
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub api_base: String,
}

impl GatewayConfig {
    pub fn is_configured(&self) -> bool {
        matches!((&self.key_id, &self.key_secret), (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty())
    }
}

/// Notes attached to an order; echoed back in webhooks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotes {
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub payment_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Amount in paise
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

/// Order as returned by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Receipt reference sent with each order: `rcpt_<unix millis>_<first 4 of user id>`
pub fn receipt_for(user_id: Uuid) -> String {
    let simple = user_id.simple().to_string();
    format!("rcpt_{}_{}", Utc::now().timestamp_millis(), &simple[..4])
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the checkout widget
    fn key_id(&self) -> Option<&str>;

    fn is_configured(&self) -> bool;

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// reqwest-backed gateway client
#[derive(Debug, Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl RazorpayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self { http, config })
    }

    fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    fn key_id(&self) -> Option<&str> {
        self.config.key_id.as_deref()
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let (Some(key_id), Some(key_secret)) = (&self.config.key_id, &self.config.key_secret)
        else {
            return Err(GatewayError::NotConfigured);
        };

        debug!(amount = request.amount, currency = %request.currency, "Creating gateway order");

        let response = self
            .http
            .post(self.orders_url())
            .basic_auth(key_id, Some(key_secret))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.description.or(e.error.code))
                .unwrap_or(body);

            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<GatewayOrder>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        let mut config = GatewayConfig::default();
        assert!(!config.is_configured());

        config.key_id = Some("rzp_test_1".to_string());
        assert!(!config.is_configured());

        config.key_secret = Some(String::new());
        assert!(!config.is_configured());

        config.key_secret = Some("s3cret".to_string());
        assert!(config.is_configured());
    }

    #[test]
    fn test_notes_use_camel_case() {
        let notes = OrderNotes {
            user_id: Uuid::nil(),
            subscription_id: Uuid::nil(),
            payment_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&notes).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("subscriptionId").is_some());
        assert!(json.get("paymentId").is_some());
    }

    #[test]
    fn test_receipt_format() {
        let user_id = Uuid::parse_str("9f2c4d1e-0000-4000-8000-000000000000").unwrap();
        let receipt = receipt_for(user_id);
        assert!(receipt.starts_with("rcpt_"));
        assert!(receipt.ends_with("_9f2c"));
    }

    #[test]
    fn test_orders_url_trims_slash() {
        let client = RazorpayClient::new(GatewayConfig {
            api_base: "http://localhost:9000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.orders_url(), "http://localhost:9000/v1/orders");
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let client = RazorpayClient::new(GatewayConfig::default()).unwrap();
        let result = client
            .create_order(&OrderRequest {
                amount: 100,
                currency: "INR".to_string(),
                receipt: "rcpt".to_string(),
                notes: OrderNotes {
                    user_id: Uuid::nil(),
                    subscription_id: Uuid::nil(),
                    payment_id: Uuid::nil(),
                },
            })
            .await;
        assert!(matches!(result, Err(GatewayError::NotConfigured)));
    }
}

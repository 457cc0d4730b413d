/// Payment model and database operations
///
/// One row per gateway order. Rows are created locally first (status
/// `created`, no provider ids), linked to the gateway order once it exists,
/// and moved to `captured` / `failed` by client verification or the gateway
/// webhook.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE payments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
///     subscription_id UUID REFERENCES subscriptions(id) ON DELETE SET NULL,
///     amount BIGINT NOT NULL CHECK (amount >= 0),
///     currency VARCHAR(3) NOT NULL DEFAULT 'INR',
///     status payment_status NOT NULL DEFAULT 'created',
///     provider_order_id VARCHAR(64) UNIQUE,
///     provider_payment_id VARCHAR(64),
///     method VARCHAR(32),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Payment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Created,
    Captured,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "created",
            PaymentStatus::Captured => "captured",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Payment row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,

    /// Amount in paise
    pub amount: i64,

    pub currency: String,
    pub status: PaymentStatus,

    /// Gateway order id (`order_...`), set once the order exists
    pub provider_order_id: Option<String>,

    /// Gateway payment id (`pay_...`), set on capture
    pub provider_payment_id: Option<String>,

    /// Payment method reported by the gateway (upi, card, netbanking, ...)
    pub method: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin listing row with payer details
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentOverview {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub payment: Payment,
    pub payer_name: String,
    pub payer_email: String,
}

/// Input for a locally initiated payment
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub amount: i64,
    pub currency: String,
}

/// Payment first seen through the gateway webhook
#[derive(Debug, Clone)]
pub struct RecordProviderPayment {
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub provider_order_id: Option<String>,
    pub provider_payment_id: String,
    pub method: Option<String>,
}

const PAYMENT_COLUMNS: &str = "id, user_id, subscription_id, amount, currency, status, \
     provider_order_id, provider_payment_id, method, created_at, updated_at";

impl Payment {
    /// Inserts a payment in `created` state without provider ids
    pub async fn create(pool: &PgPool, data: CreatePayment) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments (user_id, subscription_id, amount, currency, status)
             VALUES ($1, $2, $3, $4, 'created')
             RETURNING {PAYMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(data.user_id)
            .bind(data.subscription_id)
            .bind(data.amount)
            .bind(data.currency)
            .fetch_one(pool)
            .await
    }

    /// Records a payment reported by the gateway that has no local row yet
    pub async fn record_from_provider(
        pool: &PgPool,
        data: RecordProviderPayment,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments (user_id, subscription_id, amount, currency, status,
                                   provider_order_id, provider_payment_id, method)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PAYMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(data.user_id)
            .bind(data.subscription_id)
            .bind(data.amount)
            .bind(data.currency)
            .bind(data.status)
            .bind(data.provider_order_id)
            .bind(data.provider_payment_id)
            .bind(data.method)
            .fetch_one(pool)
            .await
    }

    /// Attaches the gateway order id to a local payment
    ///
    /// Returns false if the payment does not exist.
    pub async fn link_order(pool: &PgPool, id: Uuid, order_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payments SET provider_order_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(order_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_order_id(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE provider_order_id = $1");

        sqlx::query_as::<_, Payment>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// Applies a gateway status report to the payment for `order_id`
    ///
    /// `method` is only overwritten when the gateway reported one. A captured
    /// payment only accepts another capture, so a late `failed` report for an
    /// earlier attempt on the same order leaves it alone. Returns `None` when
    /// no payment carries that order id or the report was not applied.
    pub async fn apply_provider_update(
        pool: &PgPool,
        order_id: &str,
        status: PaymentStatus,
        provider_payment_id: &str,
        method: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE payments
             SET status = $2,
                 provider_payment_id = $3,
                 method = COALESCE($4, method),
                 updated_at = NOW()
             WHERE provider_order_id = $1
               AND (status <> 'captured' OR $2 = 'captured'::payment_status)
             RETURNING {PAYMENT_COLUMNS}"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(order_id)
            .bind(status)
            .bind(provider_payment_id)
            .bind(method)
            .fetch_optional(pool)
            .await
    }

    /// Caller's payments, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE user_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Every payment with payer name and email, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<PaymentOverview>, sqlx::Error> {
        sqlx::query_as::<_, PaymentOverview>(
            r#"
            SELECT p.id, p.user_id, p.subscription_id, p.amount, p.currency, p.status,
                   p.provider_order_id, p.provider_payment_id, p.method,
                   p.created_at, p.updated_at,
                   u.full_name AS payer_name, u.email::TEXT AS payer_email
            FROM payments p
            JOIN profiles u ON u.id = p.user_id
            ORDER BY p.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Captured).unwrap(),
            "\"captured\""
        );
        let status: PaymentStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, PaymentStatus::Refunded);
        assert_eq!(PaymentStatus::Failed.as_str(), "failed");
    }
}

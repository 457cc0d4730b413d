/// Payments
///
/// - `gateway`: order creation against the payment gateway
/// - `signature`: HMAC checks for checkout callbacks and webhooks
/// - `webhook`: gateway event parsing and application
/// - `audit`: redacted payment event log

pub mod audit;
pub mod gateway;
pub mod signature;
pub mod webhook;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::billing::cycle_end;
use crate::models::payment::{Payment, PaymentStatus};
use crate::models::subscription::{Subscription, SubscriptionStatus};

/// Currency of every order
pub const CURRENCY: &str = "INR";

/// Starts a fresh period on a `pending` subscription once it is paid for
///
/// Subscriptions in any other state are left alone. Returns true when the
/// subscription was activated.
pub async fn activate_subscription(
    pool: &PgPool,
    subscription_id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let Some(subscription) = Subscription::find_by_id(pool, subscription_id).await? else {
        return Ok(false);
    };

    if subscription.status != SubscriptionStatus::Pending {
        return Ok(false);
    }

    let end = cycle_end(now, subscription.billing_cycle);
    let activated = Subscription::activate_pending(pool, subscription_id, now, end).await?;
    if activated {
        info!(%subscription_id, end_date = %end, "Subscription activated");
    }

    Ok(activated)
}

/// Marks the payment for a verified checkout as captured and activates its
/// subscription
///
/// Returns `None` when no payment carries the order id.
pub async fn capture_verified_payment(
    pool: &PgPool,
    order_id: &str,
    provider_payment_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    let Some(payment) = Payment::apply_provider_update(
        pool,
        order_id,
        PaymentStatus::Captured,
        provider_payment_id,
        None,
    )
    .await?
    else {
        return Ok(None);
    };

    if let Some(subscription_id) = payment.subscription_id {
        activate_subscription(pool, subscription_id, Utc::now()).await?;
    }

    Ok(Some(payment))
}

/// Subscription model and database operations
///
/// A subscription ties a customer to a plan for a bounded period. New
/// subscriptions start `pending` and become `active` once a payment for them
/// is captured.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subscriptions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     customer_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
///     plan_id UUID NOT NULL REFERENCES plans(id),
///     status subscription_status NOT NULL DEFAULT 'pending',
///     billing_cycle billing_cycle NOT NULL DEFAULT 'monthly',
///     start_date TIMESTAMPTZ NOT NULL,
///     end_date TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX uq_subscriptions_one_open_per_customer
///     ON subscriptions (customer_id)
///     WHERE status IN ('active', 'pending');
/// ```
///
/// # State Machine
///
/// ```text
/// pending ──(payment captured)──> active ──(end_date passes)──> expired
///    │                              │
///    └──────────> cancelled <───────┘
/// ```
///
/// An admin extension forces the status back to `active` regardless of the
/// current state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Subscription lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Pending,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Active and pending subscriptions block a customer from buying another
    pub fn is_open(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Pending)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing cycle of a subscription
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "billing_cycle", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    /// Length of the cycle in calendar months
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Quarterly => 3,
            BillingCycle::Yearly => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

/// Subscription row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub billing_cycle: BillingCycle,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription joined with the plan it is for
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionWithPlan {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub subscription: Subscription,
    pub plan_name: String,
    pub speed_mbps: i32,
    pub plan_features: Vec<String>,
}

/// Admin listing row: subscription, plan name and customer
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionOverview {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub subscription: Subscription,
    pub plan_name: String,
    pub customer_name: String,
    pub customer_email: String,
}

/// Input for creating a subscription
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub billing_cycle: BillingCycle,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Subscription {
    /// Inserts a `pending` subscription
    ///
    /// # Errors
    ///
    /// A unique violation on `uq_subscriptions_one_open_per_customer` means
    /// the customer already holds an active or pending subscription.
    pub async fn create(pool: &PgPool, data: CreateSubscription) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (customer_id, plan_id, status, billing_cycle, start_date, end_date)
            VALUES ($1, $2, 'pending', $3, $4, $5)
            RETURNING id, customer_id, plan_id, status, billing_cycle, start_date, end_date,
                      created_at, updated_at
            "#,
        )
        .bind(data.customer_id)
        .bind(data.plan_id)
        .bind(data.billing_cycle)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, customer_id, plan_id, status, billing_cycle, start_date, end_date,
                   created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the customer's active or pending subscription, if any
    pub async fn find_open_for_customer(
        pool: &PgPool,
        customer_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, customer_id, plan_id, status, billing_cycle, start_date, end_date,
                   created_at, updated_at
            FROM subscriptions
            WHERE customer_id = $1 AND status IN ('active', 'pending')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(pool)
        .await
    }

    /// Latest active subscription of a customer
    pub async fn latest_active_for_customer(
        pool: &PgPool,
        customer_id: Uuid,
    ) -> Result<Option<SubscriptionWithPlan>, sqlx::Error> {
        sqlx::query_as::<_, SubscriptionWithPlan>(
            r#"
            SELECT s.id, s.customer_id, s.plan_id, s.status, s.billing_cycle, s.start_date,
                   s.end_date, s.created_at, s.updated_at,
                   p.name AS plan_name, p.speed_mbps, p.features AS plan_features
            FROM subscriptions s
            JOIN plans p ON p.id = s.plan_id
            WHERE s.customer_id = $1 AND s.status = 'active'
            ORDER BY s.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(pool)
        .await
    }

    /// All subscriptions of a customer with their plans, newest first
    pub async fn list_for_customer(
        pool: &PgPool,
        customer_id: Uuid,
    ) -> Result<Vec<SubscriptionWithPlan>, sqlx::Error> {
        sqlx::query_as::<_, SubscriptionWithPlan>(
            r#"
            SELECT s.id, s.customer_id, s.plan_id, s.status, s.billing_cycle, s.start_date,
                   s.end_date, s.created_at, s.updated_at,
                   p.name AS plan_name, p.speed_mbps, p.features AS plan_features
            FROM subscriptions s
            JOIN plans p ON p.id = s.plan_id
            WHERE s.customer_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(pool)
        .await
    }

    /// Every subscription with plan and customer, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<SubscriptionOverview>, sqlx::Error> {
        sqlx::query_as::<_, SubscriptionOverview>(
            r#"
            SELECT s.id, s.customer_id, s.plan_id, s.status, s.billing_cycle, s.start_date,
                   s.end_date, s.created_at, s.updated_at,
                   p.name AS plan_name,
                   c.full_name AS customer_name, c.email::TEXT AS customer_email
            FROM subscriptions s
            JOIN plans p ON p.id = s.plan_id
            JOIN profiles c ON c.id = s.customer_id
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Sets a new end date and forces the subscription active
    pub async fn extend(
        pool: &PgPool,
        id: Uuid,
        new_end: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET end_date = $2, status = 'active', updated_at = NOW()
            WHERE id = $1
            RETURNING id, customer_id, plan_id, status, billing_cycle, start_date, end_date,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(new_end)
        .fetch_optional(pool)
        .await
    }

    /// Moves a `pending` subscription to `active` with a fresh period
    ///
    /// Returns false when the subscription is missing or not pending, so a
    /// replayed capture never resets an already running period.
    pub async fn activate_pending(
        pool: &PgPool,
        id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'active', start_date = $2, end_date = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(start)
        .bind(end)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks every active subscription that ended before `now` as expired
    ///
    /// Returns the number of subscriptions expired.
    pub async fn expire_lapsed(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'expired', updated_at = NOW()
            WHERE status = 'active' AND end_date < $1
            "#,
        )
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_months() {
        assert_eq!(BillingCycle::Monthly.months(), 1);
        assert_eq!(BillingCycle::Quarterly.months(), 3);
        assert_eq!(BillingCycle::Yearly.months(), 12);
        assert_eq!(BillingCycle::default(), BillingCycle::Monthly);
    }

    #[test]
    fn test_open_statuses() {
        assert!(SubscriptionStatus::Active.is_open());
        assert!(SubscriptionStatus::Pending.is_open());
        assert!(!SubscriptionStatus::Cancelled.is_open());
        assert!(!SubscriptionStatus::Expired.is_open());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            format!("You already have an {} subscription.", SubscriptionStatus::Pending),
            "You already have an pending subscription."
        );
    }

    #[test]
    fn test_serialized_with_plan_is_flat() {
        let now = Utc::now();
        let row = SubscriptionWithPlan {
            subscription: Subscription {
                id: Uuid::new_v4(),
                customer_id: Uuid::new_v4(),
                plan_id: Uuid::new_v4(),
                status: SubscriptionStatus::Active,
                billing_cycle: BillingCycle::Quarterly,
                start_date: now,
                end_date: now,
                created_at: now,
                updated_at: now,
            },
            plan_name: "Ultra".to_string(),
            speed_mbps: 300,
            plan_features: vec![],
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["billing_cycle"], "quarterly");
        assert_eq!(json["plan_name"], "Ultra");
    }
}

/// Plan model and database operations
///
/// A plan is a purchasable broadband tier. Prices are held per billing cycle
/// in paise.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE plans (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL UNIQUE,
///     speed_mbps INTEGER NOT NULL CHECK (speed_mbps > 0),
///     price_monthly BIGINT NOT NULL CHECK (price_monthly >= 0),
///     price_quarterly BIGINT NOT NULL CHECK (price_quarterly >= 0),
///     price_yearly BIGINT NOT NULL CHECK (price_yearly >= 0),
///     features TEXT[] NOT NULL DEFAULT '{}',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::subscription::BillingCycle;

/// Plan row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plan {
    pub id: Uuid,

    /// Display name ("Basic", "Standard", ...)
    pub name: String,

    pub speed_mbps: i32,

    /// Monthly price in paise
    pub price_monthly: i64,

    /// Quarterly price in paise
    pub price_quarterly: i64,

    /// Yearly price in paise
    pub price_yearly: i64,

    pub features: Vec<String>,

    /// Inactive plans stay attached to old subscriptions but cannot be bought
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Price in paise for one billing cycle
    pub fn price_for(&self, cycle: BillingCycle) -> i64 {
        match cycle {
            BillingCycle::Monthly => self.price_monthly,
            BillingCycle::Quarterly => self.price_quarterly,
            BillingCycle::Yearly => self.price_yearly,
        }
    }
}

/// Input for creating a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlan {
    pub name: String,
    pub speed_mbps: i32,
    pub price_monthly: i64,
    pub price_quarterly: i64,
    pub price_yearly: i64,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Plan {
    pub async fn create(pool: &PgPool, data: CreatePlan) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Plan>(
            r#"
            INSERT INTO plans (name, speed_mbps, price_monthly, price_quarterly, price_yearly, features)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, speed_mbps, price_monthly, price_quarterly, price_yearly,
                      features, is_active, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.speed_mbps)
        .bind(data.price_monthly)
        .bind(data.price_quarterly)
        .bind(data.price_yearly)
        .bind(data.features)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, name, speed_mbps, price_monthly, price_quarterly, price_yearly,
                   features, is_active, created_at
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a plan that can currently be purchased
    pub async fn find_active(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        Ok(Self::find_by_id(pool, id).await?.filter(|plan| plan.is_active))
    }

    /// Lists purchasable plans, cheapest first
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, name, speed_mbps, price_monthly, price_quarterly, price_yearly,
                   features, is_active, created_at
            FROM plans
            WHERE is_active = TRUE
            ORDER BY price_monthly ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Activates or retires a plan
    ///
    /// Returns the updated plan, or `None` if it does not exist.
    pub async fn set_active(
        pool: &PgPool,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Plan>(
            r#"
            UPDATE plans
            SET is_active = $2
            WHERE id = $1
            RETURNING id, name, speed_mbps, price_monthly, price_quarterly, price_yearly,
                      features, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM plans")
            .fetch_one(pool)
            .await
    }
}

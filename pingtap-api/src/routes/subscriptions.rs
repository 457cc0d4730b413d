/// Subscription endpoints
///
/// - `POST /v1/subscriptions` - start a pending subscription
/// - `GET /v1/subscriptions/mine` - caller's subscriptions with plans
/// - `GET /v1/subscriptions/usage` - current cycle of the active subscription
/// - `POST /v1/subscriptions/:id/extend` - push the end date out (admin)
/// - `GET /v1/subscriptions` - every subscription (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pingtap_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    billing::{current_cycle, cycle_end, extended_end_date, CycleWindow, MAX_EXTENSION_DAYS},
    models::{
        plan::Plan,
        subscription::{
            BillingCycle, CreateSubscription, Subscription, SubscriptionOverview,
            SubscriptionStatus, SubscriptionWithPlan,
        },
    },
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan_id: Uuid,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
}

#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    pub days: i64,
}

#[derive(Debug, Serialize)]
pub struct ExtendResponse {
    pub subscription_id: Uuid,
    pub status: SubscriptionStatus,
    pub new_end_date: DateTime<Utc>,
}

/// Usage counters; metering is not wired up yet so they read zero
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct UsageTotals {
    pub total_gb: f64,
    pub download_gb: f64,
    pub upload_gb: f64,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub subscription: SubscriptionWithPlan,
    pub current_cycle: CycleWindow,
    pub usage: UsageTotals,
}

/// Creates a `pending` subscription for `customer_id`
///
/// Shared by the subscription and checkout endpoints.
pub(crate) async fn open_subscription(
    pool: &PgPool,
    customer_id: Uuid,
    plan_id: Uuid,
    billing_cycle: BillingCycle,
) -> ApiResult<(Subscription, Plan)> {
    let plan = Plan::find_active(pool, plan_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or inactive plan selected.".to_string()))?;

    if let Some(existing) = Subscription::find_open_for_customer(pool, customer_id).await? {
        return Err(ApiError::Conflict(format!(
            "You already have an {} subscription.",
            existing.status
        )));
    }

    let start_date = Utc::now();
    let subscription = Subscription::create(
        pool,
        CreateSubscription {
            customer_id,
            plan_id,
            billing_cycle,
            start_date,
            end_date: cycle_end(start_date, billing_cycle),
        },
    )
    .await?;

    info!(
        subscription_id = %subscription.id,
        %customer_id,
        plan = %plan.name,
        billing_cycle = billing_cycle.as_str(),
        "Subscription created"
    );

    Ok((subscription, plan))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let (subscription, _) =
        open_subscription(&state.db, auth.profile_id, req.plan_id, req.billing_cycle).await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn my_subscriptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<SubscriptionWithPlan>>> {
    Ok(Json(
        Subscription::list_for_customer(&state.db, auth.profile_id).await?,
    ))
}

pub async fn usage(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UsageResponse>> {
    let subscription = Subscription::latest_active_for_customer(&state.db, auth.profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No active subscription found.".to_string()))?;

    let current_cycle = current_cycle(subscription.subscription.start_date, Utc::now());

    Ok(Json(UsageResponse {
        subscription,
        current_cycle,
        usage: UsageTotals::default(),
    }))
}

fn validate_extension_days(days: i64) -> ApiResult<()> {
    if (1..=MAX_EXTENSION_DAYS).contains(&days) {
        Ok(())
    } else {
        Err(ApiError::invalid_field(
            "days",
            format!("Days must be between 1 and {}", MAX_EXTENSION_DAYS),
        ))
    }
}

pub async fn extend_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(subscription_id): Path<Uuid>,
    Json(req): Json<ExtendRequest>,
) -> ApiResult<Json<ExtendResponse>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;
    validate_extension_days(req.days)?;

    let current = Subscription::find_by_id(&state.db, subscription_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscription not found".to_string()))?;

    let new_end = extended_end_date(current.end_date, Utc::now(), req.days);

    let updated = Subscription::extend(&state.db, subscription_id, new_end)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscription not found".to_string()))?;

    info!(
        %subscription_id,
        admin_id = %auth.profile_id,
        days = req.days,
        new_end_date = %updated.end_date,
        "Subscription extended"
    );

    Ok(Json(ExtendResponse {
        subscription_id,
        status: updated.status,
        new_end_date: updated.end_date,
    }))
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<SubscriptionOverview>>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;
    Ok(Json(Subscription::list_all(&state.db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_days_bounds() {
        assert!(validate_extension_days(1).is_ok());
        assert!(validate_extension_days(30).is_ok());
        assert!(validate_extension_days(3650).is_ok());
        assert!(validate_extension_days(0).is_err());
        assert!(validate_extension_days(-5).is_err());
        assert!(validate_extension_days(3651).is_err());
    }

    #[test]
    fn test_billing_cycle_defaults_to_monthly() {
        let req: CreateSubscriptionRequest =
            serde_json::from_str(r#"{"plan_id":"6f1c1d7e-4c7c-4c43-9f55-0d6c7f6a9d11"}"#).unwrap();
        assert_eq!(req.billing_cycle, BillingCycle::Monthly);

        let req: CreateSubscriptionRequest = serde_json::from_str(
            r#"{"plan_id":"6f1c1d7e-4c7c-4c43-9f55-0d6c7f6a9d11","billing_cycle":"yearly"}"#,
        )
        .unwrap();
        assert_eq!(req.billing_cycle, BillingCycle::Yearly);
    }

    #[test]
    fn test_usage_totals_start_at_zero() {
        let usage = UsageTotals::default();
        assert_eq!(usage.total_gb, 0.0);
        assert_eq!(usage.download_gb, 0.0);
        assert_eq!(usage.upload_gb, 0.0);
    }
}

/// Plan catalogue endpoints
///
/// - `GET /v1/plans` - active plans, cheapest first (public)
/// - `POST /v1/plans` - create a plan (admin)
/// - `PUT /v1/plans/:id/active` - activate or retire a plan (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use pingtap_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::plan::{CreatePlan, Plan},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 2, max = 100, message = "Plan name must be 2-100 characters"))]
    pub name: String,

    #[validate(range(min = 1, message = "Speed must be positive"))]
    pub speed_mbps: i32,

    /// Prices in paise
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_monthly: i64,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_quarterly: i64,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_yearly: i64,

    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn list_active_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<Plan>>> {
    Ok(Json(Plan::list_active(&state.db).await?))
}

pub async fn create_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePlanRequest>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;
    req.validate()?;

    let plan = Plan::create(
        &state.db,
        CreatePlan {
            name: req.name.trim().to_string(),
            speed_mbps: req.speed_mbps,
            price_monthly: req.price_monthly,
            price_quarterly: req.price_quarterly,
            price_yearly: req.price_yearly,
            features: req.features,
        },
    )
    .await?;

    info!(plan_id = %plan.id, name = %plan.name, "Plan created");
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn set_plan_active(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(plan_id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<Json<Plan>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;

    let plan = Plan::set_active(&state.db, plan_id, req.is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plan not found".to_string()))?;

    Ok(Json(plan))
}

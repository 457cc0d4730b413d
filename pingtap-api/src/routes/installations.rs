/// Installation scheduling and technician jobs
///
/// - `GET /v1/installations/slots?date=YYYY-MM-DD` - bookable windows
/// - `POST /v1/installations` - book a visit for the active subscription
/// - `GET /v1/installations/mine` - caller's bookings
/// - `GET /v1/installations/jobs` - technician's assigned jobs
/// - `POST /v1/installations/:id/assign` - assign a technician (admin)
/// - `PUT /v1/installations/:id/status` - move a job along
/// - `GET /v1/installations` - every booking (admin)
/// - `GET /v1/technicians` - technician picker (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use pingtap_shared::{
    auth::{
        authorization::{caller_role, can_update_job, require_admin, require_role},
        middleware::AuthContext,
    },
    models::{
        installation::{
            is_valid_slot, CreateInstallation, Installation, InstallationOverview,
            InstallationStatus, TechnicianJob, INSTALLATION_SLOTS,
        },
        profile::{Profile, ProfileSummary, Role},
        subscription::Subscription,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub date: Option<NaiveDate>,
    pub slots: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub date: NaiveDate,
    pub slot: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub technician_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: InstallationStatus,
}

/// Slot and date checks for a booking made on `today`
fn validate_booking(req: &ScheduleRequest, today: NaiveDate) -> ApiResult<()> {
    if !is_valid_slot(&req.slot) {
        return Err(ApiError::invalid_field(
            "slot",
            "Please choose one of the available time slots",
        ));
    }

    if req.date < today {
        return Err(ApiError::invalid_field(
            "date",
            "Installation date cannot be in the past",
        ));
    }

    Ok(())
}

/// The same four windows every day
pub async fn available_slots(Query(query): Query<SlotsQuery>) -> Json<SlotsResponse> {
    Json(SlotsResponse {
        date: query.date,
        slots: &INSTALLATION_SLOTS,
    })
}

pub async fn schedule_installation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ScheduleRequest>,
) -> ApiResult<(StatusCode, Json<Installation>)> {
    validate_booking(&req, Utc::now().date_naive())?;

    let subscription = Subscription::latest_active_for_customer(&state.db, auth.profile_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(
                "No active subscription found. Please purchase a plan first.".to_string(),
            )
        })?
        .subscription;

    if Installation::find_live_for_subscription(&state.db, subscription.id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "An active installation is already scheduled for this subscription.".to_string(),
        ));
    }

    let installation = Installation::create(
        &state.db,
        CreateInstallation {
            user_id: auth.profile_id,
            subscription_id: subscription.id,
            scheduled_at: req.date.and_time(chrono::NaiveTime::MIN).and_utc(),
            slot_time: req.slot,
        },
    )
    .await?;

    info!(
        installation_id = %installation.id,
        subscription_id = %subscription.id,
        date = %req.date,
        "Installation scheduled"
    );

    Ok((StatusCode::CREATED, Json(installation)))
}

pub async fn my_installations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Installation>>> {
    Ok(Json(
        Installation::list_for_user(&state.db, auth.profile_id).await?,
    ))
}

pub async fn assign_technician(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(installation_id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<Installation>> {
    require_admin(&state.db, &auth, "Only admins can assign technicians.").await?;

    match Profile::role_of(&state.db, req.technician_id).await? {
        Some(Role::Technician) => {}
        Some(_) => {
            return Err(ApiError::BadRequest(
                "Selected profile is not a technician.".to_string(),
            ))
        }
        None => return Err(ApiError::NotFound("Technician not found".to_string())),
    }

    let installation = Installation::assign_technician(&state.db, installation_id, req.technician_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Installation not found".to_string()))?;

    info!(
        %installation_id,
        technician_id = %req.technician_id,
        "Technician assigned"
    );

    Ok(Json(installation))
}

pub async fn update_job_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(installation_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Installation>> {
    if !req.status.is_settable() {
        return Err(ApiError::invalid_field("status", "Invalid status"));
    }

    let installation = Installation::find_by_id(&state.db, installation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Installation not found".to_string()))?;

    let role = caller_role(&state.db, &auth).await?;
    if !can_update_job(auth.profile_id, role, installation.technician_id) {
        return Err(ApiError::Forbidden(
            "You are not assigned to this job.".to_string(),
        ));
    }

    let updated = Installation::update_status(&state.db, installation_id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Installation not found".to_string()))?;

    info!(
        %installation_id,
        status = updated.status.as_str(),
        updated_by = %auth.profile_id,
        "Installation status updated"
    );

    Ok(Json(updated))
}

pub async fn my_jobs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TechnicianJob>>> {
    require_role(
        &state.db,
        &auth,
        Role::Technician,
        "Only technicians have assigned jobs.",
    )
    .await?;

    Ok(Json(
        Installation::list_for_technician(&state.db, auth.profile_id).await?,
    ))
}

pub async fn list_installations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<InstallationOverview>>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;
    Ok(Json(Installation::list_all(&state.db).await?))
}

pub async fn list_technicians(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProfileSummary>>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;
    Ok(Json(Profile::list_by_role(&state.db, Role::Technician).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn request(date: NaiveDate, slot: &str) -> ScheduleRequest {
        ScheduleRequest {
            date,
            slot: slot.to_string(),
        }
    }

    #[test]
    fn test_valid_booking() {
        assert!(validate_booking(&request(today(), "09:00 AM - 11:00 AM"), today()).is_ok());

        let later = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert!(validate_booking(&request(later, "04:00 PM - 06:00 PM"), today()).is_ok());
    }

    #[test]
    fn test_unknown_slot_rejected() {
        let err = validate_booking(&request(today(), "07:00 PM - 09:00 PM"), today()).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(ref d) if d[0].field == "slot"));
    }

    #[test]
    fn test_past_date_rejected() {
        let yesterday = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        let err = validate_booking(&request(yesterday, "09:00 AM - 11:00 AM"), today()).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(ref d) if d[0].field == "date"));
    }

    #[test]
    fn test_status_request_parses_snake_case() {
        let req: UpdateStatusRequest = serde_json::from_str(r#"{"status":"in_progress"}"#).unwrap();
        assert_eq!(req.status, InstallationStatus::InProgress);
    }
}

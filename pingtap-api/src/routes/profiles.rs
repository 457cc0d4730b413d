/// Admin profile management
///
/// - `PUT /v1/profiles/:id/role` - grant a role, e.g. onboard a technician (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use pingtap_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::profile::{Profile, Role},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// An admin may not change their own role and lock themselves out
fn check_role_change(caller: Uuid, target: Uuid) -> ApiResult<()> {
    if caller == target {
        return Err(ApiError::BadRequest(
            "You cannot change your own role.".to_string(),
        ));
    }
    Ok(())
}

pub async fn set_profile_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(profile_id): Path<Uuid>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<Json<Profile>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;
    check_role_change(auth.profile_id, profile_id)?;

    if !Profile::set_role(&state.db, profile_id, req.role).await? {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }

    let profile = Profile::find_by_id(&state.db, profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    info!(
        %profile_id,
        role = ?profile.role,
        changed_by = %auth.profile_id,
        "Profile role changed"
    );

    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_role_change_rejected() {
        let id = Uuid::new_v4();
        assert!(matches!(
            check_role_change(id, id),
            Err(ApiError::BadRequest(_))
        ));
        assert!(check_role_change(id, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_role_request_parses() {
        let req: SetRoleRequest = serde_json::from_str(r#"{"role":"technician"}"#).unwrap();
        assert_eq!(req.role, Role::Technician);
    }
}

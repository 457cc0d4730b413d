/// Role and ownership checks
///
/// The caller's role is always read from `profiles` rather than trusted from
/// the token. Handlers call these helpers before touching data and convert
/// [`AuthzError`] into a 403 (or 404 for a vanished profile).
///
/// # Example
///
/// ```no_run
/// use pingtap_shared::auth::authorization::{require_admin, AuthzError};
/// use pingtap_shared::auth::middleware::AuthContext;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, auth: AuthContext) -> Result<(), AuthzError> {
/// require_admin(&pool, &auth, "Forbidden: Admin access required").await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::profile::{Profile, Role};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Token is valid but its profile no longer exists
    #[error("Profile not found")]
    ProfileNotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Current role of the caller
pub async fn caller_role(pool: &PgPool, auth: &AuthContext) -> Result<Role, AuthzError> {
    Profile::role_of(pool, auth.profile_id)
        .await?
        .ok_or(AuthzError::ProfileNotFound)
}

/// Requires the caller to hold `role`; `message` becomes the 403 text
pub async fn require_role(
    pool: &PgPool,
    auth: &AuthContext,
    role: Role,
    message: &str,
) -> Result<(), AuthzError> {
    if caller_role(pool, auth).await? != role {
        return Err(AuthzError::Forbidden(message.to_string()));
    }

    Ok(())
}

pub async fn require_admin(
    pool: &PgPool,
    auth: &AuthContext,
    message: &str,
) -> Result<(), AuthzError> {
    require_role(pool, auth, Role::Admin, message).await
}

/// Owner of a resource, or an admin
///
/// Returns the caller's role so handlers can tell which applied.
pub async fn require_owner_or_admin(
    pool: &PgPool,
    auth: &AuthContext,
    owner_id: Uuid,
) -> Result<Role, AuthzError> {
    let role = caller_role(pool, auth).await?;

    if auth.profile_id == owner_id || role == Role::Admin {
        Ok(role)
    } else {
        Err(AuthzError::Forbidden(
            "Not authorized to access this resource".to_string(),
        ))
    }
}

/// Installation jobs may be updated by admins and by the assigned technician
pub fn can_update_job(caller: Uuid, role: Role, assigned_technician: Option<Uuid>) -> bool {
    role == Role::Admin || (role == Role::Technician && assigned_technician == Some(caller))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_can_update_any_job() {
        assert!(can_update_job(Uuid::new_v4(), Role::Admin, None));
        assert!(can_update_job(Uuid::new_v4(), Role::Admin, Some(Uuid::new_v4())));
    }

    #[test]
    fn test_assigned_technician_can_update() {
        let tech = Uuid::new_v4();
        assert!(can_update_job(tech, Role::Technician, Some(tech)));
        assert!(!can_update_job(tech, Role::Technician, Some(Uuid::new_v4())));
        assert!(!can_update_job(tech, Role::Technician, None));
    }

    #[test]
    fn test_customer_cannot_update_job() {
        let customer = Uuid::new_v4();
        assert!(!can_update_job(customer, Role::Customer, Some(customer)));
    }

    #[test]
    fn test_forbidden_message_is_display() {
        let err = AuthzError::Forbidden("Only admins can assign technicians.".to_string());
        assert_eq!(err.to_string(), "Only admins can assign technicians.");
    }
}

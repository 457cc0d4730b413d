/// Authentication and profile endpoints
///
/// - `POST /v1/auth/register` - create a customer account
/// - `POST /v1/auth/login` - exchange credentials for tokens
/// - `POST /v1/auth/refresh` - new access token from a refresh token
/// - `GET /v1/auth/me` - caller's profile
/// - `PUT /v1/auth/me` - update name, phone or address

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use pingtap_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    models::profile::{validate_phone, Address, CreateProfile, Profile, Role, UpdateProfile},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "password::validate_password_strength"))]
    pub password: String,

    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub full_name: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(nested)]
    pub address: Option<Address>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub full_name: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(nested)]
    pub address: Option<Address>,
}

/// Tokens plus the profile they were issued for
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub profile: Profile,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registers a customer; the bootstrap admin email registers an admin
///
/// # Errors
///
/// - `422` validation failed
/// - `409` email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    let role = if state.config.is_bootstrap_admin(&email) {
        Role::Admin
    } else {
        Role::Customer
    };

    let password_hash = password::hash_password(&req.password)?;

    let profile = Profile::create(
        &state.db,
        CreateProfile {
            email,
            password_hash,
            full_name: req.full_name.trim().to_string(),
            phone: req.phone,
            address: req.address,
            role,
        },
    )
    .await?;

    info!(profile_id = %profile.id, role = profile.role.as_str(), "Profile registered");

    let tokens = jwt::issue_token_pair(profile.id, state.jwt_secret())?;
    Ok((StatusCode::CREATED, Json(SessionResponse { tokens, profile })))
}

/// Wrong email and wrong password produce the same 401
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    let profile = Profile::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &profile.password_hash)? {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let tokens = jwt::issue_token_pair(profile.id, state.jwt_secret())?;
    Ok(Json(SessionResponse { tokens, profile }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Profile>> {
    let profile = Profile::find_by_id(&state.db, auth.profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Profile>> {
    req.validate()?;

    let profile = Profile::update(
        &state.db,
        auth.profile_id,
        UpdateProfile {
            full_name: req.full_name.map(|name| name.trim().to_string()),
            phone: req.phone,
            address: req.address,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}

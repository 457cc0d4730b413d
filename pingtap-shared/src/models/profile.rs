/// Profile model and database operations
///
/// A profile is a portal account. Customers, administrators and field
/// technicians all live in the same table and are told apart by `role`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE profile_role AS ENUM ('customer', 'admin', 'technician');
///
/// CREATE TABLE profiles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     full_name VARCHAR(255) NOT NULL,
///     phone VARCHAR(20),
///     address JSONB,
///     role profile_role NOT NULL DEFAULT 'customer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use pingtap_shared::models::profile::{CreateProfile, Profile, Role};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let profile = Profile::create(&pool, CreateProfile {
///     email: "asha@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     full_name: "Asha Patil".to_string(),
///     phone: Some("9876543210".to_string()),
///     address: None,
///     role: Role::Customer,
/// }).await?;
///
/// let technicians = Profile::list_by_role(&pool, Role::Technician).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Portal role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "profile_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Buys plans, pays, raises tickets, books installations
    Customer,

    /// Back office: extends subscriptions, assigns jobs, answers tickets
    Admin,

    /// Field engineer working assigned installation jobs
    Technician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
            Role::Technician => "technician",
        }
    }
}

/// Kind of premises at the service address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Home,
    Office,
    Shop,
}

/// Service address, stored as JSONB on the profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Address {
    #[validate(length(min = 5, message = "Street address is required"))]
    pub street: String,

    #[serde(default)]
    pub landmark: Option<String>,

    #[validate(custom(function = "validate_pincode"))]
    pub pincode: String,

    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,

    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,

    #[validate(length(min = 1, message = "Area is required"))]
    pub area: String,

    pub address_type: AddressType,
}

impl Address {
    /// Single-line postal form used on invoices and job sheets
    ///
    /// ```
    /// use pingtap_shared::models::profile::{Address, AddressType};
    ///
    /// let address = Address {
    ///     street: "12 Lake View Towers".to_string(),
    ///     landmark: Some("Near Viviana Mall".to_string()),
    ///     pincode: "400601".to_string(),
    ///     city: "Thane".to_string(),
    ///     state: "Maharashtra".to_string(),
    ///     area: "Majiwada".to_string(),
    ///     address_type: AddressType::Home,
    /// };
    ///
    /// assert_eq!(
    ///     address.one_line(),
    ///     "12 Lake View Towers, Near Viviana Mall, Majiwada, Thane, Maharashtra - 400601"
    /// );
    /// ```
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.street.trim()];
        if let Some(landmark) = self.landmark.as_deref().map(str::trim) {
            if !landmark.is_empty() {
                parts.push(landmark);
            }
        }
        parts.push(self.area.trim());
        parts.push(self.city.trim());
        parts.push(self.state.trim());

        format!("{} - {}", parts.join(", "), self.pincode.trim())
    }
}

/// Pincodes are exactly six ASCII digits
pub fn validate_pincode(pincode: &str) -> Result<(), ValidationError> {
    if pincode.len() == 6 && pincode.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("pincode");
        err.message = Some("Pincode must be 6 digits".into());
        Err(err)
    }
}

/// Indian mobile numbers: ten digits starting with 6-9, no country code
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let valid = phone.len() == 10
        && phone.chars().all(|c| c.is_ascii_digit())
        && matches!(phone.as_bytes()[0], b'6'..=b'9');

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Enter 10 digits starting with 6-9 (without +91)".into());
        Err(err)
    }
}

/// Profile row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,

    /// Login email (case-insensitive via CITEXT)
    pub email: String,

    /// Argon2id hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub full_name: String,

    /// Ten-digit mobile number used for WhatsApp notifications
    pub phone: Option<String>,

    pub address: Option<Json<Address>>,

    pub role: Role,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a profile
#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub role: Role,
}

/// Partial profile update; `None` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

/// Slim profile projection for pickers (technician dropdowns and the like)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

const PROFILE_COLUMNS: &str =
    "id, email, password_hash, full_name, phone, address, role, created_at, updated_at";

impl Profile {
    /// Creates a new profile
    ///
    /// # Errors
    ///
    /// Fails with a unique violation when the email is already registered.
    pub async fn create(pool: &PgPool, data: CreateProfile) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles (email, password_hash, full_name, phone, address, role)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PROFILE_COLUMNS}"
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.full_name)
            .bind(data.phone)
            .bind(data.address.map(Json))
            .bind(data.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");

        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a profile by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = $1");

        sqlx::query_as::<_, Profile>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds the profile whose stored phone ends with the given ten digits
    ///
    /// Inbound WhatsApp senders arrive with a country code prefix
    /// (`919876543210`) while profiles store the bare mobile number.
    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Self>, sqlx::Error> {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 10 {
            return Ok(None);
        }
        let local = &digits[digits.len() - 10..];

        let query = format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles
             WHERE RIGHT(phone, 10) = $1
             ORDER BY created_at ASC
             LIMIT 1"
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(local)
            .fetch_optional(pool)
            .await
    }

    /// Applies a partial update, returning the updated row
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE profiles
             SET full_name = COALESCE($2, full_name),
                 phone = COALESCE($3, phone),
                 address = COALESCE($4, address),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {PROFILE_COLUMNS}"
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .bind(data.full_name)
            .bind(data.phone)
            .bind(data.address.map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Changes a profile's role
    ///
    /// Returns false if the profile does not exist.
    pub async fn set_role(pool: &PgPool, id: Uuid, role: Role) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reads only the role column, used by authorization checks
    pub async fn role_of(pool: &PgPool, id: Uuid) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_scalar::<_, Role>("SELECT role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists profiles holding a role, alphabetically
    pub async fn list_by_role(
        pool: &PgPool,
        role: Role,
    ) -> Result<Vec<ProfileSummary>, sqlx::Error> {
        sqlx::query_as::<_, ProfileSummary>(
            r#"
            SELECT id, full_name, email, phone
            FROM profiles
            WHERE role = $1
            ORDER BY full_name ASC
            "#,
        )
        .bind(role)
        .fetch_all(pool)
        .await
    }
}

/// Installation model and database operations
///
/// An installation is a technician visit booked against a subscription in
/// one of four fixed two-hour slots.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE installations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
///     subscription_id UUID NOT NULL REFERENCES subscriptions(id) ON DELETE CASCADE,
///     technician_id UUID REFERENCES profiles(id) ON DELETE SET NULL,
///     status installation_status NOT NULL DEFAULT 'pending',
///     scheduled_at TIMESTAMPTZ NOT NULL,
///     slot_time VARCHAR(32) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX uq_installations_one_live_per_subscription
///     ON installations (subscription_id)
///     WHERE status <> 'cancelled';
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::models::profile::Address;

/// Bookable installation windows, in display order
pub const INSTALLATION_SLOTS: [&str; 4] = [
    "09:00 AM - 11:00 AM",
    "11:00 AM - 01:00 PM",
    "02:00 PM - 04:00 PM",
    "04:00 PM - 06:00 PM",
];

pub fn is_valid_slot(slot: &str) -> bool {
    INSTALLATION_SLOTS.contains(&slot)
}

/// Installation job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "installation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InstallationStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl InstallationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallationStatus::Pending => "pending",
            InstallationStatus::Confirmed => "confirmed",
            InstallationStatus::InProgress => "in_progress",
            InstallationStatus::Completed => "completed",
            InstallationStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses a job can be moved to through a status update
    ///
    /// `pending` is only ever set at booking time.
    pub fn is_settable(&self) -> bool {
        !matches!(self, InstallationStatus::Pending)
    }
}

/// Installation row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Installation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub status: InstallationStatus,

    /// Booked day (midnight UTC of the chosen date)
    pub scheduled_at: DateTime<Utc>,

    /// One of [`INSTALLATION_SLOTS`]
    pub slot_time: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Technician job sheet row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TechnicianJob {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub installation: Installation,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_address: Option<Json<Address>>,
    pub plan_name: String,
}

/// Admin listing row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InstallationOverview {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub installation: Installation,
    pub customer_name: String,
    pub technician_name: Option<String>,
    pub plan_name: String,
}

/// Input for booking an installation
#[derive(Debug, Clone)]
pub struct CreateInstallation {
    pub user_id: Uuid,
    pub subscription_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub slot_time: String,
}

const INSTALLATION_COLUMNS: &str = "id, user_id, subscription_id, technician_id, status, \
     scheduled_at, slot_time, created_at, updated_at";

impl Installation {
    /// Books a `pending` installation
    ///
    /// # Errors
    ///
    /// A unique violation on `uq_installations_one_live_per_subscription`
    /// means a non-cancelled installation already exists.
    pub async fn create(pool: &PgPool, data: CreateInstallation) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO installations (user_id, subscription_id, status, scheduled_at, slot_time)
             VALUES ($1, $2, 'pending', $3, $4)
             RETURNING {INSTALLATION_COLUMNS}"
        );

        sqlx::query_as::<_, Installation>(&query)
            .bind(data.user_id)
            .bind(data.subscription_id)
            .bind(data.scheduled_at)
            .bind(data.slot_time)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {INSTALLATION_COLUMNS} FROM installations WHERE id = $1");

        sqlx::query_as::<_, Installation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds the non-cancelled installation of a subscription
    pub async fn find_live_for_subscription(
        pool: &PgPool,
        subscription_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {INSTALLATION_COLUMNS} FROM installations
             WHERE subscription_id = $1 AND status <> 'cancelled'
             LIMIT 1"
        );

        sqlx::query_as::<_, Installation>(&query)
            .bind(subscription_id)
            .fetch_optional(pool)
            .await
    }

    /// Caller's installations, newest booking first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {INSTALLATION_COLUMNS} FROM installations
             WHERE user_id = $1
             ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Installation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Assigns a technician and confirms the job
    pub async fn assign_technician(
        pool: &PgPool,
        id: Uuid,
        technician_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE installations
             SET technician_id = $2, status = 'confirmed', updated_at = NOW()
             WHERE id = $1
             RETURNING {INSTALLATION_COLUMNS}"
        );

        sqlx::query_as::<_, Installation>(&query)
            .bind(id)
            .bind(technician_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: InstallationStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE installations
             SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {INSTALLATION_COLUMNS}"
        );

        sqlx::query_as::<_, Installation>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Jobs assigned to a technician, earliest visit first
    pub async fn list_for_technician(
        pool: &PgPool,
        technician_id: Uuid,
    ) -> Result<Vec<TechnicianJob>, sqlx::Error> {
        sqlx::query_as::<_, TechnicianJob>(
            r#"
            SELECT i.id, i.user_id, i.subscription_id, i.technician_id, i.status,
                   i.scheduled_at, i.slot_time, i.created_at, i.updated_at,
                   c.full_name AS customer_name,
                   c.phone AS customer_phone,
                   c.address AS customer_address,
                   p.name AS plan_name
            FROM installations i
            JOIN profiles c ON c.id = i.user_id
            JOIN subscriptions s ON s.id = i.subscription_id
            JOIN plans p ON p.id = s.plan_id
            WHERE i.technician_id = $1
            ORDER BY i.scheduled_at ASC
            "#,
        )
        .bind(technician_id)
        .fetch_all(pool)
        .await
    }

    /// Every installation with customer, technician and plan names
    pub async fn list_all(pool: &PgPool) -> Result<Vec<InstallationOverview>, sqlx::Error> {
        sqlx::query_as::<_, InstallationOverview>(
            r#"
            SELECT i.id, i.user_id, i.subscription_id, i.technician_id, i.status,
                   i.scheduled_at, i.slot_time, i.created_at, i.updated_at,
                   c.full_name AS customer_name,
                   t.full_name AS technician_name,
                   p.name AS plan_name
            FROM installations i
            JOIN profiles c ON c.id = i.user_id
            LEFT JOIN profiles t ON t.id = i.technician_id
            JOIN subscriptions s ON s.id = i.subscription_id
            JOIN plans p ON p.id = s.plan_id
            ORDER BY i.scheduled_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_slots() {
        assert_eq!(INSTALLATION_SLOTS.len(), 4);
        assert!(is_valid_slot("09:00 AM - 11:00 AM"));
        assert!(is_valid_slot("04:00 PM - 06:00 PM"));
        assert!(!is_valid_slot("01:00 PM - 02:00 PM"));
        assert!(!is_valid_slot(""));
    }

    #[test]
    fn test_in_progress_wire_format() {
        let status: InstallationStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, InstallationStatus::InProgress);
        assert_eq!(status.as_str(), "in_progress");
    }

    #[test]
    fn test_pending_not_settable() {
        assert!(!InstallationStatus::Pending.is_settable());
        assert!(InstallationStatus::Confirmed.is_settable());
        assert!(InstallationStatus::Cancelled.is_settable());
    }
}

/// Support ticket and ticket message models
///
/// # Schema
///
/// ```sql
/// CREATE TABLE support_tickets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     customer_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
///     subject VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     status ticket_status NOT NULL DEFAULT 'open',
///     priority ticket_priority NOT NULL DEFAULT 'medium',
///     resolved_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE ticket_messages (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     ticket_id UUID NOT NULL REFERENCES support_tickets(id) ON DELETE CASCADE,
///     sender_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
///     sender_role sender_role NOT NULL,
///     message TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Open and in-progress tickets still need attention
    pub fn is_pending(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Who wrote a ticket message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sender_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    User,
    Admin,
}

/// Ticket row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Short human reference, e.g. `TKT-3F2A9C1B`
    pub fn reference(&self) -> String {
        ticket_reference(self.id)
    }
}

/// `TKT-` followed by the first eight hex digits of the id, uppercased
pub fn ticket_reference(id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!("TKT-{}", simple[..8].to_uppercase())
}

/// Subject stored for a ticket: `[category] subject` when a category is given
pub fn compose_subject(category: Option<&str>, subject: &str) -> String {
    match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => format!("[{category}] {subject}"),
        None => subject.to_string(),
    }
}

/// Ticket with the customer's name, for admin listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketOverview {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub ticket: Ticket,
    pub customer_name: String,
}

/// Ticket message row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub sender_id: Uuid,
    pub sender_role: SenderRole,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Input for opening a ticket
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub customer_id: Uuid,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
}

/// Ticket counters for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStats {
    pub total_tickets: i64,
    pub pending_tickets: i64,
}

const TICKET_COLUMNS: &str = "id, customer_id, subject, description, status, priority, \
     resolved_at, created_at, updated_at";

impl Ticket {
    /// Opens a ticket in `open` state
    pub async fn create(pool: &PgPool, data: CreateTicket) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO support_tickets (customer_id, subject, description, status, priority)
             VALUES ($1, $2, $3, 'open', $4)
             RETURNING {TICKET_COLUMNS}"
        );

        sqlx::query_as::<_, Ticket>(&query)
            .bind(data.customer_id)
            .bind(data.subject)
            .bind(data.description)
            .bind(data.priority)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TICKET_COLUMNS} FROM support_tickets WHERE id = $1");

        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent open or in-progress ticket of a customer
    pub async fn latest_pending_for_customer(
        pool: &PgPool,
        customer_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets
             WHERE customer_id = $1 AND status IN ('open', 'in_progress')
             ORDER BY created_at DESC
             LIMIT 1"
        );

        sqlx::query_as::<_, Ticket>(&query)
            .bind(customer_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_customer(
        pool: &PgPool,
        customer_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TICKET_COLUMNS} FROM support_tickets
             WHERE customer_id = $1
             ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Ticket>(&query)
            .bind(customer_id)
            .fetch_all(pool)
            .await
    }

    /// All tickets with customer names, newest first
    ///
    /// `limit` caps the result (used by the dashboard's recent list).
    pub async fn list_all(
        pool: &PgPool,
        limit: Option<i64>,
    ) -> Result<Vec<TicketOverview>, sqlx::Error> {
        sqlx::query_as::<_, TicketOverview>(
            r#"
            SELECT t.id, t.customer_id, t.subject, t.description, t.status, t.priority,
                   t.resolved_at, t.created_at, t.updated_at,
                   c.full_name AS customer_name
            FROM support_tickets t
            JOIN profiles c ON c.id = t.customer_id
            ORDER BY t.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Sets the status; `resolved` also stamps `resolved_at`
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE support_tickets
             SET status = $2,
                 resolved_at = CASE WHEN $2 = 'resolved'::ticket_status THEN NOW() ELSE resolved_at END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {TICKET_COLUMNS}"
        );

        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    pub async fn stats(pool: &PgPool) -> Result<TicketStats, sqlx::Error> {
        let (total_tickets, pending_tickets) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status IN ('open', 'in_progress'))
            FROM support_tickets
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(TicketStats {
            total_tickets,
            pending_tickets,
        })
    }
}

impl TicketMessage {
    pub async fn create(
        pool: &PgPool,
        ticket_id: Uuid,
        sender_id: Uuid,
        sender_role: SenderRole,
        message: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TicketMessage>(
            r#"
            INSERT INTO ticket_messages (ticket_id, sender_id, sender_role, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, ticket_id, sender_id, sender_role, message, created_at
            "#,
        )
        .bind(ticket_id)
        .bind(sender_id)
        .bind(sender_role)
        .bind(message)
        .fetch_one(pool)
        .await
    }

    /// Messages of a ticket in chronological order
    pub async fn list_for_ticket(pool: &PgPool, ticket_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TicketMessage>(
            r#"
            SELECT id, ticket_id, sender_id, sender_role, message, created_at
            FROM ticket_messages
            WHERE ticket_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_reference() {
        let id = Uuid::parse_str("3f2a9c1b-0000-4000-8000-000000000000").unwrap();
        assert_eq!(ticket_reference(id), "TKT-3F2A9C1B");
    }

    #[test]
    fn test_compose_subject() {
        assert_eq!(compose_subject(Some("Billing"), "Double charge"), "[Billing] Double charge");
        assert_eq!(compose_subject(None, "No internet"), "No internet");
        assert_eq!(compose_subject(Some("  "), "No internet"), "No internet");
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
    }

    #[test]
    fn test_pending_statuses() {
        assert!(TicketStatus::Open.is_pending());
        assert!(TicketStatus::InProgress.is_pending());
        assert!(!TicketStatus::Resolved.is_pending());
        assert!(!TicketStatus::Closed.is_pending());
    }
}

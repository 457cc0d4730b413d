/// Support ticket endpoints
///
/// - `POST /v1/tickets` - open a ticket (WhatsApp confirmation when the caller has a phone)
/// - `GET /v1/tickets/mine` - caller's tickets
/// - `GET /v1/tickets/:id` - ticket with its conversation (owner or admin)
/// - `POST /v1/tickets/:id/messages` - reply on a ticket (owner or admin)
/// - `PUT /v1/tickets/:id/status` - change status (admin)
/// - `GET /v1/tickets` - every ticket (admin)
/// - `GET /v1/admin/dashboard` - ticket counters and recent tickets (admin)

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
    auth::{
        authorization::{require_admin, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::{
        profile::{Profile, Role},
        ticket::{
            compose_subject, CreateTicket, SenderRole, Ticket, TicketMessage, TicketOverview,
            TicketPriority, TicketStats, TicketStatus,
        },
    },
    notify::{send_best_effort, WhatsAppMessage},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

const RECENT_TICKETS: i64 = 5;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    /// Stored as "[category] subject"; the limits keep that within the column
    #[validate(length(max = 50, message = "Category must be at most 50 characters"))]
    pub category: Option<String>,

    #[serde(default)]
    pub priority: TicketPriority,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 5000, message = "Message cannot be empty"))]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub reference: String,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: TicketStats,
    pub recent_tickets: Vec<TicketOverview>,
}

/// WhatsApp confirmation sent after a ticket is opened
pub fn ticket_created_message(name: &str, reference: &str, category: &str, subject: &str) -> String {
    format!(
        "Hello {name}, your ticket *{reference}* for *{category}* has been created.\n\n\
         Subject: {subject}\n\n\
         Our team will contact you shortly."
    )
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTicketRequest>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    req.validate()?;

    let profile = Profile::find_by_id(&state.db, auth.profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let subject = req.subject.trim();
    let ticket = Ticket::create(
        &state.db,
        CreateTicket {
            customer_id: profile.id,
            subject: compose_subject(req.category.as_deref(), subject),
            description: req.description.trim().to_string(),
            priority: req.priority,
        },
    )
    .await?;

    info!(ticket_id = %ticket.id, reference = %ticket.reference(), "Ticket created");

    if let Some(phone) = profile.phone.as_deref() {
        let category = req
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("General");

        let body = ticket_created_message(&profile.full_name, &ticket.reference(), category, subject);
        send_best_effort(state.notifier.as_ref(), &WhatsAppMessage::text(phone, body)).await;
    }

    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn my_tickets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(Ticket::list_for_customer(&state.db, auth.profile_id).await?))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
) -> ApiResult<Json<TicketDetail>> {
    let ticket = Ticket::find_by_id(&state.db, ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    require_owner_or_admin(&state.db, &auth, ticket.customer_id).await?;

    let messages = TicketMessage::list_for_ticket(&state.db, ticket_id).await?;

    Ok(Json(TicketDetail {
        reference: ticket.reference(),
        ticket,
        messages,
    }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<TicketMessage>)> {
    req.validate()?;

    let ticket = Ticket::find_by_id(&state.db, ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    let role = require_owner_or_admin(&state.db, &auth, ticket.customer_id).await?;
    let sender_role = if role == Role::Admin {
        SenderRole::Admin
    } else {
        SenderRole::User
    };

    let message = TicketMessage::create(
        &state.db,
        ticket_id,
        auth.profile_id,
        sender_role,
        req.message.trim(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn update_ticket_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<Uuid>,
    Json(req): Json<UpdateTicketStatusRequest>,
) -> ApiResult<Json<Ticket>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;

    let ticket = Ticket::update_status(&state.db, ticket_id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    info!(%ticket_id, status = ?ticket.status, "Ticket status updated");
    Ok(Json(ticket))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TicketOverview>>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;
    Ok(Json(Ticket::list_all(&state.db, None).await?))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;

    let stats = Ticket::stats(&state.db).await?;
    let recent_tickets = Ticket::list_all(&state.db, Some(RECENT_TICKETS)).await?;

    Ok(Json(DashboardResponse {
        stats,
        recent_tickets,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_created_message() {
        let text = ticket_created_message("Asha", "TKT-3F2A9C1B", "Billing", "Double charge");
        assert_eq!(
            text,
            "Hello Asha, your ticket *TKT-3F2A9C1B* for *Billing* has been created.\n\n\
             Subject: Double charge\n\n\
             Our team will contact you shortly."
        );
    }

    #[test]
    fn test_create_request_defaults_priority() {
        let req: CreateTicketRequest = serde_json::from_str(
            r#"{"subject":"No internet","description":"Router shows red light since morning"}"#,
        )
        .unwrap();
        assert_eq!(req.priority, TicketPriority::Medium);
        assert!(req.category.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_description_rejected() {
        let req = CreateTicketRequest {
            subject: "Slow".to_string(),
            description: String::new(),
            category: None,
            priority: TicketPriority::Low,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn test_long_category_rejected() {
        let req = CreateTicketRequest {
            subject: "s".repeat(200),
            description: "Router keeps rebooting".to_string(),
            category: Some("c".repeat(60)),
            priority: TicketPriority::Medium,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("category"));
    }

    #[test]
    fn test_longest_valid_subject_fits_column() {
        let req = CreateTicketRequest {
            subject: "s".repeat(200),
            description: "Router keeps rebooting".to_string(),
            category: Some("c".repeat(50)),
            priority: TicketPriority::Medium,
        };
        assert!(req.validate().is_ok());

        let stored = compose_subject(req.category.as_deref(), &req.subject);
        assert!(stored.chars().count() <= 255);
    }

    #[test]
    fn test_empty_message_rejected() {
        let req = SendMessageRequest {
            message: String::new(),
        };
        assert!(req.validate().is_err());
    }
}

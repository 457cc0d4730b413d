/// Inbound webhooks from the payment gateway and WhatsApp
///
/// - `POST /v1/webhooks/razorpay` - signed payment events
/// - `GET /v1/webhooks/whatsapp` - subscription handshake
/// - `POST /v1/webhooks/whatsapp` - inbound customer messages
///
/// None of these routes carry a bearer token; the gateway webhook is
/// authenticated by its HMAC signature over the raw body.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pingtap_shared::{
    models::{
        profile::Profile,
        ticket::{SenderRole, Ticket, TicketMessage},
    },
    notify::whatsapp::{parse_inbound, InboundMessage},
    payments::{
        signature::verify_webhook_signature,
        webhook::{apply_event, WebhookEvent},
    },
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, warn};

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

pub async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let secret = state
        .config
        .payments
        .webhook_secret
        .as_deref()
        .ok_or_else(|| ApiError::SupportRequired("Configuration Error".to_string()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Signature".to_string()))?;

    if verify_webhook_signature(secret, &body, signature).is_err() {
        warn!("Rejected payment webhook with invalid signature");
        return Err(ApiError::Unauthorized("Invalid Signature".to_string()));
    }

    let event = WebhookEvent::parse(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

    let outcome = apply_event(&state.db, &event).await?;
    info!(event = %event.event, ?outcome, "Payment webhook processed");

    Ok(Json(json!({ "status": "ok" })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,

    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,

    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Meta's subscription handshake: echo the challenge when the token matches
pub async fn whatsapp_verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let (Some(mode), Some(token)) = (query.mode.as_deref(), query.verify_token.as_deref()) else {
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };

    let expected = state.config.whatsapp.verify_token.as_deref();
    if mode == "subscribe" && expected == Some(token) {
        info!("WhatsApp webhook verified");
        (StatusCode::OK, query.challenge.unwrap_or_default()).into_response()
    } else {
        (StatusCode::FORBIDDEN, "Forbidden").into_response()
    }
}

/// Appends an inbound text to the sender's latest pending ticket
///
/// Returns `None` when the sender is unknown, sent no text, or has no open
/// ticket.
async fn append_to_open_ticket(
    pool: &PgPool,
    inbound: &InboundMessage,
) -> Result<Option<TicketMessage>, sqlx::Error> {
    let Some(text) = inbound.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    let Some(profile) = Profile::find_by_phone(pool, &inbound.from).await? else {
        return Ok(None);
    };

    let Some(ticket) = Ticket::latest_pending_for_customer(pool, profile.id).await? else {
        return Ok(None);
    };

    TicketMessage::create(pool, ticket.id, profile.id, SenderRole::User, text)
        .await
        .map(Some)
}

pub async fn whatsapp_receive(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    if body.get("object").is_none() {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    if let Some(inbound) = parse_inbound(&body) {
        info!(from = %inbound.from, "Received WhatsApp message");

        match append_to_open_ticket(&state.db, &inbound).await {
            Ok(Some(message)) => {
                info!(ticket_id = %message.ticket_id, "WhatsApp message added to ticket")
            }
            Ok(None) => info!(from = %inbound.from, "No open ticket for WhatsApp sender"),
            Err(e) => warn!(error = %e, "Failed to store WhatsApp message"),
        }
    }

    (StatusCode::OK, "EVENT_RECEIVED").into_response()
}

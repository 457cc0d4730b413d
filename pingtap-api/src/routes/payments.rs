/// Payment endpoints
///
/// - `POST /v1/payments/orders` - gateway order for an existing subscription
/// - `POST /v1/payments/checkout` - new subscription and its order in one call
/// - `POST /v1/payments/verify` - confirm a checkout with the gateway signature
/// - `GET /v1/payments/mine` - caller's payments
/// - `GET /v1/payments/:id/invoice` - invoice for a payment
/// - `GET /v1/payments` - every payment (admin)
///
/// Order creation writes the payment row before calling the gateway and
/// links the gateway order afterwards. A gateway failure leaves the row in
/// `created` without an order id.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::subscriptions::open_subscription,
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
    invoice::{load_source, Invoice},
    models::{
        payment::{CreatePayment, Payment, PaymentOverview},
        plan::Plan,
        subscription::{BillingCycle, Subscription},
    },
    payments::{
        audit::{log_payment_event, PaymentEvent},
        capture_verified_payment,
        gateway::{receipt_for, OrderNotes, OrderRequest},
        signature::verify_payment_signature,
        CURRENCY,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub subscription_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan_id: Uuid,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Everything the checkout widget needs
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub payment_id: Uuid,
    pub subscription_id: Uuid,
    pub order_id: String,
    /// Paise
    pub amount: i64,
    pub currency: String,
    pub key_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub status: &'static str,
    pub payment: Payment,
}

/// Rejects order creation when payments are switched off or the gateway
/// has no credentials
fn ensure_payments_available(state: &AppState, user_id: Uuid) -> ApiResult<()> {
    if !state.config.payments.enabled {
        log_payment_event(
            PaymentEvent::PaymentDisabled,
            "Payment attempt while payments are disabled",
            json!({ "userId": user_id }),
        );
        return Err(ApiError::ServiceUnavailable {
            code: "PAYMENT_DISABLED",
            message: "Payments are temporarily disabled".to_string(),
        });
    }

    if !state.gateway.is_configured() {
        log_payment_event(
            PaymentEvent::ProviderNotConfigured,
            "Payment provider credentials missing",
            json!({ "userId": user_id }),
        );
        return Err(ApiError::ServiceUnavailable {
            code: "PAYMENT_PROVIDER_NOT_CONFIGURED",
            message: "Payment provider is not configured".to_string(),
        });
    }

    Ok(())
}

/// Creates the payment row, the gateway order, then links the two
async fn start_order(
    state: &AppState,
    user_id: Uuid,
    subscription: &Subscription,
    plan: &Plan,
) -> ApiResult<OrderResponse> {
    log_payment_event(
        PaymentEvent::CreateOrderAttempt,
        "Creating payment order",
        json!({ "userId": user_id, "subscriptionId": subscription.id }),
    );

    ensure_payments_available(state, user_id)?;

    let amount = plan.price_for(subscription.billing_cycle);

    let payment = Payment::create(
        &state.db,
        CreatePayment {
            user_id,
            subscription_id: Some(subscription.id),
            amount,
            currency: CURRENCY.to_string(),
        },
    )
    .await?;

    let request = OrderRequest {
        amount,
        currency: CURRENCY.to_string(),
        receipt: receipt_for(user_id),
        notes: OrderNotes {
            user_id,
            subscription_id: subscription.id,
            payment_id: payment.id,
        },
    };

    let order = match state.gateway.create_order(&request).await {
        Ok(order) => order,
        Err(e) => {
            log_payment_event(
                PaymentEvent::Error,
                "Gateway order creation failed",
                json!({ "paymentId": payment.id, "error": e.to_string() }),
            );
            return Err(ApiError::SupportRequired(format!(
                "Failed to create payment order. Payment reference: {}",
                payment.id
            )));
        }
    };

    let linked = Payment::link_order(&state.db, payment.id, &order.id)
        .await
        .unwrap_or_else(|e| {
            log_payment_event(
                PaymentEvent::Error,
                "Failed to link gateway order",
                json!({ "paymentId": payment.id, "orderId": order.id, "error": e.to_string() }),
            );
            false
        });

    if !linked {
        return Err(ApiError::SupportRequired(
            "Payment initialized but failed to link order. Please contact support.".to_string(),
        ));
    }

    log_payment_event(
        PaymentEvent::OrderCreated,
        "Payment order created",
        json!({
            "paymentId": payment.id,
            "orderId": order.id,
            "amount": amount,
        }),
    );

    Ok(OrderResponse {
        payment_id: payment.id,
        subscription_id: subscription.id,
        order_id: order.id,
        amount,
        currency: CURRENCY.to_string(),
        key_id: state.gateway.key_id().map(str::to_string),
    })
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let subscription = Subscription::find_by_id(&state.db, req.subscription_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Subscription not found".to_string()))?;

    if subscription.customer_id != auth.profile_id {
        return Err(ApiError::Forbidden(
            "Subscription does not belong to you".to_string(),
        ));
    }

    let plan = Plan::find_by_id(&state.db, subscription.plan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Plan not found".to_string()))?;

    let order = start_order(&state, auth.profile_id, &subscription, &plan).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn checkout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    ensure_payments_available(&state, auth.profile_id)?;

    let (subscription, plan) =
        open_subscription(&state.db, auth.profile_id, req.plan_id, req.billing_cycle).await?;

    let order = start_order(&state, auth.profile_id, &subscription, &plan).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Checks `hex(HMAC-SHA256(key_secret, order_id|payment_id))` and captures
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<VerifyPaymentRequest>,
) -> ApiResult<Json<VerifyPaymentResponse>> {
    let key_secret = state.config.payments.key_secret.as_deref().ok_or_else(|| {
        ApiError::ServiceUnavailable {
            code: "PAYMENT_PROVIDER_NOT_CONFIGURED",
            message: "Payment provider is not configured".to_string(),
        }
    })?;

    verify_payment_signature(key_secret, &req.order_id, &req.payment_id, &req.signature)?;

    let existing = Payment::find_by_order_id(&state.db, &req.order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    if existing.user_id != auth.profile_id {
        return Err(ApiError::Forbidden(
            "Payment does not belong to you".to_string(),
        ));
    }

    let payment = capture_verified_payment(&state.db, &req.order_id, &req.payment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    tracing::info!(
        payment_id = %payment.id,
        order_id = %req.order_id,
        "Payment verified"
    );

    Ok(Json(VerifyPaymentResponse {
        status: "success",
        payment,
    }))
}

pub async fn my_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(Payment::list_for_user(&state.db, auth.profile_id).await?))
}

pub async fn invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(payment_id): Path<Uuid>,
) -> ApiResult<Json<Invoice>> {
    let source = load_source(&state.db, payment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))?;

    require_owner_or_admin(&state.db, &auth, source.user_id).await?;

    Ok(Json(Invoice::build(source)))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PaymentOverview>>> {
    require_admin(&state.db, &auth, "Forbidden: Admin access required").await?;
    Ok(Json(Payment::list_all(&state.db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_default_cycle() {
        let req: CheckoutRequest =
            serde_json::from_str(r#"{"plan_id":"6f1c1d7e-4c7c-4c43-9f55-0d6c7f6a9d11"}"#).unwrap();
        assert_eq!(req.billing_cycle, BillingCycle::Monthly);
    }

    #[test]
    fn test_order_response_shape() {
        let response = OrderResponse {
            payment_id: Uuid::nil(),
            subscription_id: Uuid::nil(),
            order_id: "order_123".to_string(),
            amount: 79_900,
            currency: "INR".to_string(),
            key_id: Some("rzp_test_key".to_string()),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["order_id"], "order_123");
        assert_eq!(value["amount"], 79_900);
        assert_eq!(value["key_id"], "rzp_test_key");
    }
}

//! Invoices
//!
//! An invoice is derived from a payment on request; nothing is stored.
//! Rendering (PDF, print) is left to clients, which receive the document as
//! JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::billing::format_rupees;
use crate::models::payment::PaymentStatus;
use crate::models::profile::Address;
use crate::models::subscription::BillingCycle;

pub const SELLER_NAME: &str = "PingTap Broadband";
pub const SELLER_ADDRESS: &str = "123 Fiber Street, Digital City";
pub const SELLER_SUPPORT_PHONE: &str = "+91 98765 43210";
pub const SELLER_EMAIL: &str = "billing@pingtap.com";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Seller {
    pub name: &'static str,
    pub address: &'static str,
    pub support_phone: &'static str,
    pub email: &'static str,
}

impl Default for Seller {
    fn default() -> Self {
        Self {
            name: SELLER_NAME,
            address: SELLER_ADDRESS,
            support_phone: SELLER_SUPPORT_PHONE,
            email: SELLER_EMAIL,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LineItem {
    pub description: String,
    /// Paise
    pub amount: i64,
    /// Rupees, two decimals
    pub amount_display: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Invoice {
    pub invoice_number: String,
    pub payment_id: Uuid,
    pub date: DateTime<Utc>,
    pub customer_name: String,
    pub customer_address: String,
    pub seller: Seller,
    pub items: Vec<LineItem>,
    pub total_amount: i64,
    pub total_display: String,
    pub currency: String,
    pub status: PaymentStatus,
}

/// Everything an invoice is built from
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceSource {
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_address: Option<Json<Address>>,
    pub plan_name: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
}

/// `INV-` followed by the first eight hex digits of the payment id, uppercased
pub fn invoice_number(payment_id: Uuid) -> String {
    let simple = payment_id.simple().to_string();
    format!("INV-{}", simple[..8].to_uppercase())
}

impl Invoice {
    pub fn build(source: InvoiceSource) -> Self {
        let description = match (&source.plan_name, source.billing_cycle) {
            (Some(plan), Some(cycle)) => format!("{plan} ({})", cycle.as_str()),
            (Some(plan), None) => plan.clone(),
            _ => "Broadband service".to_string(),
        };

        let customer_address = source
            .customer_address
            .as_ref()
            .map(|a| a.0.one_line())
            .unwrap_or_else(|| "N/A".to_string());

        Self {
            invoice_number: invoice_number(source.payment_id),
            payment_id: source.payment_id,
            date: source.created_at,
            customer_name: source.customer_name,
            customer_address,
            seller: Seller::default(),
            items: vec![LineItem {
                description,
                amount: source.amount,
                amount_display: format_rupees(source.amount),
            }],
            total_amount: source.amount,
            total_display: format_rupees(source.amount),
            currency: source.currency,
            status: source.status,
        }
    }
}

/// Loads the payment, payer and plan for an invoice
pub async fn load_source(pool: &PgPool, payment_id: Uuid) -> Result<Option<InvoiceSource>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceSource>(
        r#"
        SELECT p.id AS payment_id, p.user_id, p.amount, p.currency, p.status, p.created_at,
               u.full_name AS customer_name,
               u.address AS customer_address,
               pl.name AS plan_name,
               s.billing_cycle
        FROM payments p
        JOIN profiles u ON u.id = p.user_id
        LEFT JOIN subscriptions s ON s.id = p.subscription_id
        LEFT JOIN plans pl ON pl.id = s.plan_id
        WHERE p.id = $1
        "#,
    )
    .bind(payment_id)
    .fetch_optional(pool)
    .await
}

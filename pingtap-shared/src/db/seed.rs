/// Default plan catalogue
///
/// Fresh installs start with three plans. Seeding is skipped once the
/// `plans` table holds any row, so admin edits are never overwritten.

use sqlx::PgPool;
use tracing::info;

use crate::models::plan::{CreatePlan, Plan};

/// The three launch plans, prices in paise
pub fn default_plans() -> Vec<CreatePlan> {
    vec![
        CreatePlan {
            name: "Basic Plan".to_string(),
            speed_mbps: 50,
            price_monthly: 49_900,
            price_quarterly: 149_900,
            price_yearly: 569_900,
            features: vec![
                "50 Mbps Speed".to_string(),
                "Unlimited Data".to_string(),
                "No OTT".to_string(),
            ],
        },
        CreatePlan {
            name: "Standard Plan".to_string(),
            speed_mbps: 100,
            price_monthly: 79_900,
            price_quarterly: 239_900,
            price_yearly: 919_900,
            features: vec![
                "100 Mbps Speed".to_string(),
                "Unlimited Data".to_string(),
                "Amazon Prime".to_string(),
                "Dual Band Router".to_string(),
            ],
        },
        CreatePlan {
            name: "Ultra Plan".to_string(),
            speed_mbps: 300,
            price_monthly: 129_900,
            price_quarterly: 389_900,
            price_yearly: 1_499_900,
            features: vec![
                "300 Mbps Speed".to_string(),
                "Unlimited Data".to_string(),
                "Netflix & Prime".to_string(),
                "Mesh Router".to_string(),
            ],
        },
    ]
}

/// Inserts [`default_plans`] when the catalogue is empty
///
/// Returns the number of plans inserted (zero when plans already exist).
pub async fn seed_default_plans(pool: &PgPool) -> Result<usize, sqlx::Error> {
    let existing = Plan::count(pool).await?;
    if existing > 0 {
        info!(existing, "Plans already exist, skipping seed");
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let plans = default_plans();
    for plan in &plans {
        sqlx::query(
            r#"
            INSERT INTO plans (name, speed_mbps, price_monthly, price_quarterly, price_yearly, features)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&plan.name)
        .bind(plan.speed_mbps)
        .bind(plan.price_monthly)
        .bind(plan.price_quarterly)
        .bind(plan.price_yearly)
        .bind(&plan.features)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(inserted = plans.len(), "Seeded default plans");
    Ok(plans.len())
}

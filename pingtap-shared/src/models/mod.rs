/// Database models for PingTap
///
/// One module per table, each exposing the row type plus its queries as
/// associated async functions taking a `&PgPool`.
///
/// # Models
///
/// - `profile`: portal accounts (customers, admins, technicians)
/// - `plan`: purchasable broadband tiers
/// - `subscription`: a customer's period on a plan
/// - `payment`: gateway orders and their outcome
/// - `installation`: technician visits
/// - `ticket`: support tickets and their message threads
///
/// # Example
///
/// ```no_run
/// use pingtap_shared::models::plan::Plan;
/// use pingtap_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// for plan in Plan::list_active(&pool).await? {
///     println!("{} - {} Mbps", plan.name, plan.speed_mbps);
/// }
/// # Ok(())
/// # }
/// ```

pub mod installation;
pub mod payment;
pub mod plan;
pub mod profile;
pub mod subscription;
pub mod ticket;

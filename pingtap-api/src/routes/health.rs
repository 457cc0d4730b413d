/// Liveness and database reachability
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// { "status": "healthy", "service": "pingtap-api", "version": "0.1.0", "database": "connected" }
/// ```
///
/// A failed `SELECT 1` still answers 200 with `status: "degraded"` so load
/// balancers can tell a sick database from a dead process.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
}

impl HealthResponse {
    fn from_database(connected: bool) -> Self {
        let (status, database) = if connected {
            ("healthy", "connected")
        } else {
            ("degraded", "disconnected")
        };

        Self {
            status: status.to_string(),
            service: "pingtap-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = sqlx::query("SELECT 1").fetch_one(&state.db).await.is_ok();

    if !connected {
        tracing::warn!("Health check could not reach the database");
    }

    Ok(Json(HealthResponse::from_database(connected)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_when_database_down() {
        let response = HealthResponse::from_database(false);
        assert_eq!(response.status, "degraded");
        assert_eq!(response.database, "disconnected");
    }

    #[test]
    fn test_healthy_when_database_up() {
        let response = HealthResponse::from_database(true);
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, "pingtap-api");
    }
}

/// Service availability lookup
///
/// `GET /v1/coverage?pincode=400601&area=Majiwada`

use axum::{extract::Query, Json};
use pingtap_shared::coverage::{check_availability, Coverage, SERVICE_AREAS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CoverageQuery {
    pub pincode: String,
    #[serde(default)]
    pub area: String,
}

#[derive(Debug, Serialize)]
pub struct CoverageResponse {
    pub pincode: String,
    pub area: String,
    pub status: Coverage,
    pub areas: &'static [&'static str],
}

pub async fn check_coverage(Query(query): Query<CoverageQuery>) -> Json<CoverageResponse> {
    let status = check_availability(&query.pincode, &query.area);

    Json(CoverageResponse {
        pincode: query.pincode,
        area: query.area,
        status,
        areas: &SERVICE_AREAS,
    })
}

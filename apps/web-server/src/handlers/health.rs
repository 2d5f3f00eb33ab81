//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub storage: &'static str,
}

/// GET /api/health
///
/// Reports `degraded` with 503 when the store cannot answer a count query.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let storage_ok = match state.follows.count().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Health check storage test failed: {}", e);
            false
        }
    };

    let response = HealthResponse {
        status: if storage_ok { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage: if storage_ok { "ok" } else { "unavailable" },
    };

    if storage_ok {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

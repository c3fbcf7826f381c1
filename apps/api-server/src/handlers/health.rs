//! Health check and root banner.

use actix_web::{HttpResponse, web};

use merpati_shared::dto::HealthResponse;
use merpati_shared::{ApiResponse, ErrorResponse};

use crate::state::AppState;

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let ready = state.is_ready().await;
    let response = HealthResponse {
        status: if ready { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ready,
        timestamp: chrono::Utc::now(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// GET /
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::message("Welcome to KataMerpati API!"))
}

/// Fallback for unknown paths.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found())
}

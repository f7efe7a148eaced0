use super::AppState;
use crate::error::ApiError;
use actix_web::{web, HttpResponse, Result};
use shared_types::{HealthResponse, VersionResponse};
use tracing::debug;

pub async fn health_check(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let uptime = data
        .start_time
        .elapsed()
        .map_err(|e| ApiError::Internal(format!("Failed to calculate uptime: {e}")))?
        .as_secs();
    debug!(uptime_secs = uptime, "Health check");

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn version() -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(VersionResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    }))
}

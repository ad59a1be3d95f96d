use crate::{
    types::{AppError, HealthResponse, Result, ServiceInfo},
    AppState,
};
use axum::{extract::State, Json};

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service information", body = ServiceInfo)),
    tag = "health"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Knowledge Assistant API is running!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs: if cfg!(feature = "swagger-ui") {
            "/docs"
        } else {
            "/api/openapi.json"
        }
        .to_string(),
        status: "healthy".to_string(),
    })
}

/// Database and storage health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable")
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    if let Err(e) = state.turso.ping().await {
        return Err(AppError::Unavailable(format!(
            "Service unhealthy: database unreachable ({})",
            e
        )));
    }

    let upload_dir = state.config_manager.config().storage.upload_dir.clone();
    let upload_dir_exists = tokio::fs::metadata(&upload_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        database: "connected".to_string(),
        upload_dir: upload_dir_exists,
    }))
}

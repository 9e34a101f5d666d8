use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

use aronx_types::api::{DbHealthResponse, StatusResponse};

use crate::state::AppState;

/// GET /
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/db
pub async fn database(State(state): State<AppState>) -> impl IntoResponse {
    match state.provisioner.check_store().await {
        Ok(()) => (
            StatusCode::OK,
            Json(DbHealthResponse {
                database: "ok".to_string(),
                detail: None,
            }),
        ),
        Err(e) => {
            warn!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(DbHealthResponse {
                    database: "error".to_string(),
                    detail: Some(e.to_string()),
                }),
            )
        }
    }
}

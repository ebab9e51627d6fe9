use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    message: &'static str,
    status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "ok",
        status: "healthy",
    })
}

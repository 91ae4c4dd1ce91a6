use axum::Json;
use tracing::info;

use contributrack_types::api::HealthResponse;

pub async fn hello() -> Json<&'static str> {
    info!("Greeting requested");
    Json("Hello, World!")
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

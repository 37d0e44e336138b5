use axum::{extract::State, routing::get, Json, Router};

use crate::config::SERVICE_NAME;
use crate::http::types::{HealthResponse, VersionResponse};

#[derive(Clone)]
pub struct ServiceInfo { pub build_env: String }

pub fn router(info: ServiceInfo) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .with_state(info)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy", service: SERVICE_NAME })
}

async fn version(State(info): State<ServiceInfo>) -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION"), service: SERVICE_NAME, build_env: info.build_env })
}

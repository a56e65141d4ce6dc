//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::Result;
use crate::{AppState, Backend};

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Health check handler. Fails when the database is unreachable.
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    if let Backend::Postgres(executor) = &state.backend {
        sqlx::query("SELECT 1").execute(executor.pool()).await?;
    }

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend.name().to_string(),
    }))
}

/// Root handler.
async fn root() -> &'static str {
    "Folio Pagination Server"
}

// src/routes/health.rs
//! Liveness endpoint for the dashboard process.
//!
//! Answers `GET /health` with the process status and whether the shared
//! store is reachable, so a supervisor can tell "dashboard up, store gone"
//! apart from "dashboard down".

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::DashboardConfig;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

/// Handle `GET /health`: 200 when the store answers a trivial query, 503 otherwise.
async fn health(
    State((pool, _config)): State<(SqlitePool, DashboardConfig)>,
) -> (StatusCode, Json<HealthResponse>) {
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!("Health check could not reach the store: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    database: "unreachable",
                }),
            )
        }
    }
}

/// Build the health-check router.
///
/// # Returns
/// A [`Router`] with a single GET `/health` route, awaiting the gateway's
/// `(SqlitePool, DashboardConfig)` state.
pub fn router() -> Router<(SqlitePool, DashboardConfig)> {
    Router::new().route("/health", get(health))
}

//! `GET /api/readings`: the dashboard window as JSON.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::{store, DashboardConfig};

// ---

pub fn router() -> Router<(SqlitePool, DashboardConfig)> {
    // ---
    Router::new().route("/api/readings", get(handler))
}

async fn handler(State((pool, _config)): State<(SqlitePool, DashboardConfig)>) -> impl IntoResponse {
    // ---
    match store::recent_readings(&pool, Utc::now().naive_utc()).await {
        Ok(rows) => {
            debug!("GET /api/readings - returning {} rows", rows.len());
            (StatusCode::OK, Json(rows)).into_response()
        }
        Err(e) => {
            error!("Failed to query readings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("Failed to query readings"),
            )
                .into_response()
        }
    }
}

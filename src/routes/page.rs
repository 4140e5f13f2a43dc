//! `GET /`: the HTML dashboard, rebuilt from the store on every request.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::{dashboard, store, DashboardConfig};

// ---

pub fn router() -> Router<(SqlitePool, DashboardConfig)> {
    // ---
    Router::new().route("/", get(handler))
}

async fn handler(State((pool, config)): State<(SqlitePool, DashboardConfig)>) -> impl IntoResponse {
    // ---
    let now = Utc::now().naive_utc();

    let rows = match store::recent_readings(&pool, now).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to query readings for dashboard: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to query readings",
            )
                .into_response();
        }
    };

    info!("GET / - rendering {} rows", rows.len());
    Html(dashboard::render_page(&config.location, &rows, now)).into_response()
}

use axum::Router;
use sqlx::SqlitePool;

use crate::DashboardConfig;

mod health;
mod page;
mod readings;

// ---

/// Build the dashboard gateway: `GET /`, `GET /api/readings` and `GET /health`.
///
/// # Returns
/// A [`Router`] with the pool and dashboard config installed as shared
/// state, ready for [`axum::serve`].
pub fn router(pool: SqlitePool, config: DashboardConfig) -> Router {
    // ---
    Router::new()
        .merge(page::router())
        .merge(readings::router())
        .merge(health::router())
        .with_state((pool, config))
}

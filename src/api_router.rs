//! Unified API router: merges every feature module's routes into one tree.

use axum::{routing::get, Json, Router};
use std::sync::Arc;

use crate::shared::state::AppState;

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .merge(crate::hierarchy::configure_hierarchy_routes())
        .merge(crate::standards::configure_standards_routes())
        .merge(crate::interchange::configure_interchange_routes())
        .merge(crate::directory::configure_directory_routes())
        .merge(crate::observations::configure_observation_routes())
        .merge(crate::dashboards::configure_dashboard_routes())
        .merge(crate::catalyst::configure_catalyst_routes())
}

//! Reporting dashboards: entity counts and recent observation activity.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use diesel::dsl::avg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::shared::models::{Observation, Standard, User};
use crate::shared::schema::{
    areas, departments, facilities, observations, organizations, standards, users,
};
use crate::shared::state::AppState;
use crate::shared::{db_unavailable, internal_error, ApiError};

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub organizations: i64,
    pub facilities: i64,
    pub departments: i64,
    pub areas: i64,
    pub standards: i64,
    pub active_users: i64,
    pub observations_total: i64,
    pub observations_finalized: i64,
    pub observations_today: i64,
    pub average_observed_performance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecentObservation {
    #[serde(flatten)]
    pub observation: Observation,
    pub observer_name: String,
    pub standard_name: String,
}

pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let organization_count: i64 = organizations::table
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;
    let facility_count: i64 = facilities::table
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;
    let department_count: i64 = departments::table
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;
    let area_count: i64 = areas::table
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;
    let standard_count: i64 = standards::table
        .filter(standards::is_current_version.eq(true))
        .filter(standards::is_active.eq(true))
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;
    let active_users: i64 = users::table
        .filter(users::is_active.eq(true))
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;
    let observations_total: i64 = observations::table
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;
    let observations_finalized: i64 = observations::table
        .filter(observations::is_finalized.eq(true))
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;

    let today_start = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now);
    let observations_today: i64 = observations::table
        .filter(observations::started_at.ge(today_start))
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard count failed", e))?;

    let average_observed_performance: Option<f64> = observations::table
        .select(avg(observations::observed_performance))
        .get_result(&mut conn)
        .map_err(|e| internal_error("Dashboard average failed", e))?;

    Ok(Json(DashboardStats {
        organizations: organization_count,
        facilities: facility_count,
        departments: department_count,
        areas: area_count,
        standards: standard_count,
        active_users,
        observations_total,
        observations_finalized,
        observations_today,
        average_observed_performance,
    }))
}

pub async fn recent_observations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<RecentObservation>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let rows: Vec<(Observation, User, Standard)> = observations::table
        .inner_join(users::table)
        .inner_join(standards::table)
        .order(observations::started_at.desc())
        .limit(query.limit.unwrap_or(10).clamp(1, 100))
        .load(&mut conn)
        .map_err(|e| internal_error("Recent observation query failed", e))?;

    Ok(Json(
        rows.into_iter()
            .map(|(observation, user, standard)| RecentObservation {
                observation,
                observer_name: user.name,
                standard_name: standard.name,
            })
            .collect(),
    ))
}

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboards/stats", get(dashboard_stats))
        .route(
            "/api/dashboards/recent-observations",
            get(recent_observations),
        )
}

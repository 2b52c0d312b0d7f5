use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::models::Area;
use crate::shared::schema::{areas, departments, standards};
use crate::shared::state::AppState;
use crate::shared::{api_error, db_unavailable, internal_error, ApiError};

use super::conflict_or_internal;

#[derive(Debug, Deserialize)]
pub struct CreateAreaRequest {
    pub name: String,
    pub department_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAreaRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AreaQuery {
    pub department_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AreaWithCounts {
    #[serde(flatten)]
    pub area: Area,
    pub standard_count: i64,
}

pub async fn create_area(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAreaRequest>,
) -> Result<Json<Area>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "name is required"));
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let department_exists: bool = diesel::select(diesel::dsl::exists(
        departments::table.find(req.department_id),
    ))
    .get_result(&mut conn)
    .map_err(|e| internal_error("Department lookup failed", e))?;
    if !department_exists {
        return Err(api_error(StatusCode::BAD_REQUEST, "Department not found"));
    }

    let now = Utc::now();
    let area = Area {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        department_id: req.department_id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(areas::table)
        .values(&area)
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "An area with this name already exists in the department",
                "Area insert failed",
            )
        })?;

    log::info!("Created area '{}'", area.name);
    Ok(Json(area))
}

pub async fn list_areas(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<Vec<Area>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut q = areas::table.into_boxed();
    if let Some(department_id) = query.department_id {
        q = q.filter(areas::department_id.eq(department_id));
    }
    if let Some(search) = query.search {
        q = q.filter(areas::name.ilike(format!("%{search}%")));
    }

    let rows: Vec<Area> = q
        .order(areas::name.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Area query failed", e))?;
    Ok(Json(rows))
}

pub async fn get_area(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AreaWithCounts>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let area: Area = areas::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Area query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Area not found"))?;

    let standard_count: i64 = standards::table
        .filter(standards::area_id.eq(id))
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Standard count failed", e))?;

    Ok(Json(AreaWithCounts {
        area,
        standard_count,
    }))
}

pub async fn update_area(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAreaRequest>,
) -> Result<Json<Area>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut area: Area = areas::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Area query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Area not found"))?;

    if let Some(name) = req.name {
        area.name = name;
    }
    area.updated_at = Utc::now();

    diesel::update(areas::table.find(id))
        .set(&area)
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "An area with this name already exists in the department",
                "Area update failed",
            )
        })?;

    Ok(Json(area))
}

pub async fn delete_area(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let deleted = diesel::delete(areas::table.find(id))
        .execute(&mut conn)
        .map_err(|e| conflict_or_internal(e, "Area still has standards", "Area delete failed"))?;

    if deleted == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Area not found"));
    }
    log::info!("Deleted area {id}");
    Ok(StatusCode::NO_CONTENT)
}

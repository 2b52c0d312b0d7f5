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

use crate::shared::models::Department;
use crate::shared::schema::{areas, departments, facilities};
use crate::shared::state::AppState;
use crate::shared::{api_error, db_unavailable, internal_error, ApiError};

use super::conflict_or_internal;

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub facility_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentQuery {
    pub facility_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentWithCounts {
    #[serde(flatten)]
    pub department: Department,
    pub area_count: i64,
}

pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDepartmentRequest>,
) -> Result<Json<Department>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "name is required"));
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let facility_exists: bool =
        diesel::select(diesel::dsl::exists(facilities::table.find(req.facility_id)))
            .get_result(&mut conn)
            .map_err(|e| internal_error("Facility lookup failed", e))?;
    if !facility_exists {
        return Err(api_error(StatusCode::BAD_REQUEST, "Facility not found"));
    }

    let now = Utc::now();
    let department = Department {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        facility_id: req.facility_id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(departments::table)
        .values(&department)
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "A department with this name already exists in the facility",
                "Department insert failed",
            )
        })?;

    log::info!("Created department '{}'", department.name);
    Ok(Json(department))
}

pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DepartmentQuery>,
) -> Result<Json<Vec<Department>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut q = departments::table.into_boxed();
    if let Some(facility_id) = query.facility_id {
        q = q.filter(departments::facility_id.eq(facility_id));
    }
    if let Some(search) = query.search {
        q = q.filter(departments::name.ilike(format!("%{search}%")));
    }

    let rows: Vec<Department> = q
        .order(departments::name.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Department query failed", e))?;
    Ok(Json(rows))
}

pub async fn get_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DepartmentWithCounts>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let department: Department = departments::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Department query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Department not found"))?;

    let area_count: i64 = areas::table
        .filter(areas::department_id.eq(id))
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Area count failed", e))?;

    Ok(Json(DepartmentWithCounts {
        department,
        area_count,
    }))
}

pub async fn update_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDepartmentRequest>,
) -> Result<Json<Department>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut department: Department = departments::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Department query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Department not found"))?;

    if let Some(name) = req.name {
        department.name = name;
    }
    department.updated_at = Utc::now();

    diesel::update(departments::table.find(id))
        .set(&department)
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "A department with this name already exists in the facility",
                "Department update failed",
            )
        })?;

    Ok(Json(department))
}

pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let deleted = diesel::delete(departments::table.find(id))
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(e, "Department still has areas", "Department delete failed")
        })?;

    if deleted == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Department not found"));
    }
    log::info!("Deleted department {id}");
    Ok(StatusCode::NO_CONTENT)
}

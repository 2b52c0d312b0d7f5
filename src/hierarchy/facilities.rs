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

use crate::shared::models::Facility;
use crate::shared::schema::{departments, facilities, organizations};
use crate::shared::state::AppState;
use crate::shared::{api_error, db_unavailable, internal_error, ApiError};

use super::conflict_or_internal;

#[derive(Debug, Deserialize)]
pub struct CreateFacilityRequest {
    pub name: String,
    pub organization_id: Uuid,
    pub ref_code: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFacilityRequest {
    pub name: Option<String>,
    pub ref_code: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FacilityQuery {
    pub organization_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FacilityWithCounts {
    #[serde(flatten)]
    pub facility: Facility,
    pub department_count: i64,
}

pub async fn create_facility(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFacilityRequest>,
) -> Result<Json<Facility>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "name is required"));
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let organization_exists: bool = diesel::select(diesel::dsl::exists(
        organizations::table.find(req.organization_id),
    ))
    .get_result(&mut conn)
    .map_err(|e| internal_error("Organization lookup failed", e))?;
    if !organization_exists {
        return Err(api_error(StatusCode::BAD_REQUEST, "Organization not found"));
    }

    let now = Utc::now();
    let facility = Facility {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        ref_code: req.ref_code,
        city: req.city,
        organization_id: req.organization_id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(facilities::table)
        .values(&facility)
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "A facility with this name already exists in the organization",
                "Facility insert failed",
            )
        })?;

    log::info!("Created facility '{}'", facility.name);
    Ok(Json(facility))
}

pub async fn list_facilities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FacilityQuery>,
) -> Result<Json<Vec<Facility>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut q = facilities::table.into_boxed();
    if let Some(organization_id) = query.organization_id {
        q = q.filter(facilities::organization_id.eq(organization_id));
    }
    if let Some(search) = query.search {
        q = q.filter(facilities::name.ilike(format!("%{search}%")));
    }

    let rows: Vec<Facility> = q
        .order(facilities::name.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Facility query failed", e))?;
    Ok(Json(rows))
}

pub async fn get_facility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FacilityWithCounts>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let facility: Facility = facilities::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Facility query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Facility not found"))?;

    let department_count: i64 = departments::table
        .filter(departments::facility_id.eq(id))
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Department count failed", e))?;

    Ok(Json(FacilityWithCounts {
        facility,
        department_count,
    }))
}

pub async fn update_facility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateFacilityRequest>,
) -> Result<Json<Facility>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut facility: Facility = facilities::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Facility query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Facility not found"))?;

    if let Some(name) = req.name {
        facility.name = name;
    }
    if let Some(ref_code) = req.ref_code {
        facility.ref_code = Some(ref_code);
    }
    if let Some(city) = req.city {
        facility.city = Some(city);
    }
    facility.updated_at = Utc::now();

    diesel::update(facilities::table.find(id))
        .set(&facility)
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "A facility with this name already exists in the organization",
                "Facility update failed",
            )
        })?;

    Ok(Json(facility))
}

pub async fn delete_facility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let deleted = diesel::delete(facilities::table.find(id))
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(e, "Facility still has departments", "Facility delete failed")
        })?;

    if deleted == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Facility not found"));
    }
    log::info!("Deleted facility {id}");
    Ok(StatusCode::NO_CONTENT)
}

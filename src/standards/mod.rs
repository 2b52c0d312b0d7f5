//! Standards: versioned specifications of expected work content for an area,
//! composed of UOM entries, best practices, and process opportunities.

pub mod versioning;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::models::{Area, Department, Standard, UomEntry};
use crate::shared::schema::{areas, departments, standards, uom_entries};
use crate::shared::state::AppState;
use crate::shared::{api_error, db_unavailable, internal_error, ApiError};

use versioning::{family_base_id, NewVersionInput, VersioningError};

#[derive(Debug, Clone, Deserialize)]
pub struct UomEntryInput {
    pub uom: String,
    pub description: String,
    pub sam_value: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStandardRequest {
    pub name: String,
    pub facility_id: Uuid,
    pub department_id: Uuid,
    pub area_id: Uuid,
    #[serde(default)]
    pub best_practices: Vec<String>,
    #[serde(default)]
    pub process_opportunities: Vec<String>,
    #[serde(default)]
    pub uom_entries: Vec<UomEntryInput>,
    pub version_notes: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStandardRequest {
    pub name: Option<String>,
    pub best_practices: Option<Vec<String>>,
    pub process_opportunities: Option<Vec<String>>,
    pub version_notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StandardListQuery {
    pub facility_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub area_id: Option<Uuid>,
    pub current_only: Option<bool>,
    pub active_only: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct StandardWithDetails {
    #[serde(flatten)]
    pub standard: Standard,
    pub uom_entries: Vec<UomEntry>,
}

fn validate_uom_inputs(entries: &[UomEntryInput]) -> Result<(), ApiError> {
    for entry in entries {
        if entry.uom.trim().is_empty() {
            return Err(api_error(StatusCode::BAD_REQUEST, "UOM name is required"));
        }
        if !(entry.sam_value.is_finite() && entry.sam_value > 0.0) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("UOM '{}' samValue must be a positive number", entry.uom),
            ));
        }
    }
    Ok(())
}

/// The denormalized facility/department FKs must match the area's actual
/// ancestry.
fn check_ancestry(
    conn: &mut PgConnection,
    facility_id: Uuid,
    department_id: Uuid,
    area_id: Uuid,
) -> Result<(), ApiError> {
    let area: Area = areas::table
        .find(area_id)
        .first(conn)
        .optional()
        .map_err(|e| internal_error("Area lookup failed", e))?
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Area not found"))?;
    if area.department_id != department_id {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Area does not belong to the given department",
        ));
    }
    let department: Department = departments::table
        .find(department_id)
        .first(conn)
        .optional()
        .map_err(|e| internal_error("Department lookup failed", e))?
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Department not found"))?;
    if department.facility_id != facility_id {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Department does not belong to the given facility",
        ));
    }
    Ok(())
}

pub async fn create_standard(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStandardRequest>,
) -> Result<Json<StandardWithDetails>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "name is required"));
    }
    validate_uom_inputs(&req.uom_entries)?;

    let mut conn = state.conn.get().map_err(db_unavailable)?;
    check_ancestry(&mut conn, req.facility_id, req.department_id, req.area_id)?;

    let now = Utc::now();
    let standard = Standard {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        facility_id: req.facility_id,
        department_id: req.department_id,
        area_id: req.area_id,
        version: 1,
        base_standard_id: None,
        is_current_version: true,
        is_active: true,
        best_practices: req.best_practices,
        process_opportunities: req.process_opportunities,
        version_notes: req.version_notes,
        created_by: req.created_by,
        created_at: now,
        updated_at: now,
    };

    let entries = conn
        .transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::insert_into(standards::table)
                .values(&standard)
                .execute(conn)?;
            let mut inserted = Vec::with_capacity(req.uom_entries.len());
            for entry in &req.uom_entries {
                let uom = UomEntry {
                    id: Uuid::new_v4(),
                    uom: entry.uom.clone(),
                    description: entry.description.clone(),
                    sam_value: entry.sam_value,
                    tags: entry.tags.clone(),
                    standard_id: standard.id,
                    created_at: now,
                };
                diesel::insert_into(uom_entries::table)
                    .values(&uom)
                    .execute(conn)?;
                inserted.push(uom);
            }
            Ok(inserted)
        })
        .map_err(|e| internal_error("Failed to create standard", e))?;

    log::info!("Created standard '{}' ({})", standard.name, standard.id);
    Ok(Json(StandardWithDetails {
        standard,
        uom_entries: entries,
    }))
}

pub async fn list_standards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StandardListQuery>,
) -> Result<Json<Vec<Standard>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut q = standards::table.into_boxed();
    if let Some(facility_id) = query.facility_id {
        q = q.filter(standards::facility_id.eq(facility_id));
    }
    if let Some(department_id) = query.department_id {
        q = q.filter(standards::department_id.eq(department_id));
    }
    if let Some(area_id) = query.area_id {
        q = q.filter(standards::area_id.eq(area_id));
    }
    if query.current_only.unwrap_or(true) {
        q = q.filter(standards::is_current_version.eq(true));
    }
    if query.active_only.unwrap_or(true) {
        q = q.filter(standards::is_active.eq(true));
    }
    if let Some(search) = query.search {
        q = q.filter(standards::name.ilike(format!("%{search}%")));
    }

    let rows: Vec<Standard> = q
        .order(standards::name.asc())
        .limit(query.limit.unwrap_or(100))
        .offset(query.offset.unwrap_or(0))
        .load(&mut conn)
        .map_err(|e| internal_error("Standard query failed", e))?;

    Ok(Json(rows))
}

pub async fn get_standard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<StandardWithDetails>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let standard: Standard = standards::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Standard query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Standard not found"))?;

    let entries: Vec<UomEntry> = uom_entries::table
        .filter(uom_entries::standard_id.eq(id))
        .order(uom_entries::created_at.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("UOM query failed", e))?;

    Ok(Json(StandardWithDetails {
        standard,
        uom_entries: entries,
    }))
}

pub async fn update_standard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStandardRequest>,
) -> Result<Json<Standard>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut standard: Standard = standards::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Standard query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Standard not found"))?;

    if let Some(name) = req.name {
        standard.name = name;
    }
    if let Some(best_practices) = req.best_practices {
        standard.best_practices = best_practices;
    }
    if let Some(process_opportunities) = req.process_opportunities {
        standard.process_opportunities = process_opportunities;
    }
    if let Some(version_notes) = req.version_notes {
        standard.version_notes = Some(version_notes);
    }
    if let Some(is_active) = req.is_active {
        standard.is_active = is_active;
    }
    standard.updated_at = Utc::now();

    diesel::update(standards::table.find(id))
        .set(&standard)
        .execute(&mut conn)
        .map_err(|e| internal_error("Standard update failed", e))?;

    Ok(Json(standard))
}

/// Soft delete: published standards are never removed, only deactivated.
pub async fn delete_standard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Standard>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let updated: Standard = diesel::update(standards::table.find(id))
        .set((
            standards::is_active.eq(false),
            standards::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)
        .optional()
        .map_err(|e| internal_error("Standard deactivation failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Standard not found"))?;

    log::info!("Deactivated standard {id}");
    Ok(Json(updated))
}

pub async fn create_version(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(input): Json<NewVersionInput>,
) -> Result<Json<Standard>, ApiError> {
    if let Some(entries) = &input.uom_entries {
        validate_uom_inputs(entries)?;
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;
    match versioning::create_new_version(&mut conn, id, &input) {
        Ok(standard) => Ok(Json(standard)),
        Err(VersioningError::NotFound) => {
            Err(api_error(StatusCode::NOT_FOUND, "Original standard not found"))
        }
        Err(VersioningError::Database(e)) => Err(internal_error("Version creation failed", e)),
    }
}

/// Full version history of the family the given standard belongs to, newest
/// first.
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Standard>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let standard: Standard = standards::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Standard query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Standard not found"))?;

    let base_id = family_base_id(&standard);
    let family: Vec<Standard> = standards::table
        .filter(
            standards::id
                .eq(base_id)
                .or(standards::base_standard_id.eq(base_id)),
        )
        .order(standards::version.desc())
        .load(&mut conn)
        .map_err(|e| internal_error("Version history query failed", e))?;

    Ok(Json(family))
}

pub fn configure_standards_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/standards", get(list_standards).post(create_standard))
        .route(
            "/api/standards/:id",
            get(get_standard)
                .put(update_standard)
                .delete(delete_standard),
        )
        .route(
            "/api/standards/:id/versions",
            get(list_versions).post(create_version),
        )
}

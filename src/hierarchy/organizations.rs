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

use crate::shared::models::Organization;
use crate::shared::schema::{facilities, organizations};
use crate::shared::state::AppState;
use crate::shared::{api_error, db_unavailable, internal_error, ApiError};

use super::conflict_or_internal;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub code: String,
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationWithCounts {
    #[serde(flatten)]
    pub organization: Organization,
    pub facility_count: i64,
}

pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<Json<Organization>, ApiError> {
    if req.name.trim().is_empty() || req.code.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "name and code are required",
        ));
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;
    let now = Utc::now();
    let organization = Organization {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        code: req.code.trim().to_string(),
        logo: req.logo,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(organizations::table)
        .values(&organization)
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "An organization with this code already exists",
                "Organization insert failed",
            )
        })?;

    log::info!("Created organization '{}' ({})", organization.name, organization.code);
    Ok(Json(organization))
}

pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrganizationQuery>,
) -> Result<Json<Vec<Organization>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut q = organizations::table.into_boxed();
    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            organizations::name
                .ilike(pattern.clone())
                .or(organizations::code.ilike(pattern)),
        );
    }

    let rows: Vec<Organization> = q
        .order(organizations::name.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Organization query failed", e))?;
    Ok(Json(rows))
}

pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrganizationWithCounts>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let organization: Organization = organizations::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Organization query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Organization not found"))?;

    let facility_count: i64 = facilities::table
        .filter(facilities::organization_id.eq(id))
        .count()
        .get_result(&mut conn)
        .map_err(|e| internal_error("Facility count failed", e))?;

    Ok(Json(OrganizationWithCounts {
        organization,
        facility_count,
    }))
}

pub async fn update_organization(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrganizationRequest>,
) -> Result<Json<Organization>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut organization: Organization = organizations::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Organization query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Organization not found"))?;

    if let Some(name) = req.name {
        organization.name = name;
    }
    if let Some(code) = req.code {
        organization.code = code;
    }
    if let Some(logo) = req.logo {
        organization.logo = Some(logo);
    }
    organization.updated_at = Utc::now();

    diesel::update(organizations::table.find(id))
        .set(&organization)
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "An organization with this code already exists",
                "Organization update failed",
            )
        })?;

    Ok(Json(organization))
}

pub async fn delete_organization(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let deleted = diesel::delete(organizations::table.find(id))
        .execute(&mut conn)
        .map_err(|e| {
            conflict_or_internal(
                e,
                "Organization still has facilities",
                "Organization delete failed",
            )
        })?;

    if deleted == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Organization not found"));
    }
    log::info!("Deleted organization {id}");
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::models::{Permission, Role, RolePermission};
use crate::shared::schema::{permissions, role_permissions, roles};
use crate::shared::state::AppState;
use crate::shared::{api_error, db_unavailable, internal_error, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub module: String,
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct GrantPermissionRequest {
    pub permission_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

pub async fn create_role(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoleRequest>,
) -> Result<Json<Role>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "name is required"));
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;
    let role = Role {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        description: req.description,
        created_at: Utc::now(),
    };

    diesel::insert_into(roles::table)
        .values(&role)
        .execute(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => api_error(StatusCode::CONFLICT, "A role with this name already exists"),
            other => internal_error("Role insert failed", other),
        })?;

    log::info!("Created role '{}'", role.name);
    Ok(Json(role))
}

pub async fn list_roles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Role>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;
    let rows: Vec<Role> = roles::table
        .order(roles::name.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Role query failed", e))?;
    Ok(Json(rows))
}

pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleWithPermissions>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let role: Role = roles::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Role query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Role not found"))?;

    let granted: Vec<Permission> = role_permissions::table
        .inner_join(permissions::table)
        .filter(role_permissions::role_id.eq(id))
        .select(permissions::all_columns)
        .order((permissions::module.asc(), permissions::action.asc()))
        .load(&mut conn)
        .map_err(|e| internal_error("Permission query failed", e))?;

    Ok(Json(RoleWithPermissions {
        role,
        permissions: granted,
    }))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<Role>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut role: Role = roles::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Role query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Role not found"))?;

    if let Some(name) = req.name {
        role.name = name;
    }
    if let Some(description) = req.description {
        role.description = Some(description);
    }

    diesel::update(roles::table.find(id))
        .set(&role)
        .execute(&mut conn)
        .map_err(|e| internal_error("Role update failed", e))?;

    Ok(Json(role))
}

pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let deleted = diesel::delete(roles::table.find(id))
        .execute(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                _,
            ) => api_error(StatusCode::CONFLICT, "Role is still assigned to users"),
            other => internal_error("Role delete failed", other),
        })?;

    if deleted == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Role not found"));
    }
    log::info!("Deleted role {id}");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;
    let rows: Vec<Permission> = permissions::table
        .order((permissions::module.asc(), permissions::action.asc()))
        .load(&mut conn)
        .map_err(|e| internal_error("Permission query failed", e))?;
    Ok(Json(rows))
}

pub async fn create_permission(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePermissionRequest>,
) -> Result<Json<Permission>, ApiError> {
    if req.module.trim().is_empty() || req.action.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "module and action are required",
        ));
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;
    let permission = Permission {
        id: Uuid::new_v4(),
        module: req.module.trim().to_string(),
        action: req.action.trim().to_string(),
        created_at: Utc::now(),
    };

    diesel::insert_into(permissions::table)
        .values(&permission)
        .execute(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => api_error(StatusCode::CONFLICT, "Permission already exists"),
            other => internal_error("Permission insert failed", other),
        })?;

    Ok(Json(permission))
}

pub async fn grant_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<GrantPermissionRequest>,
) -> Result<Json<RolePermission>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let grant = RolePermission {
        id: Uuid::new_v4(),
        role_id: id,
        permission_id: req.permission_id,
    };

    diesel::insert_into(role_permissions::table)
        .values(&grant)
        .on_conflict((role_permissions::role_id, role_permissions::permission_id))
        .do_nothing()
        .execute(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                _,
            ) => api_error(StatusCode::BAD_REQUEST, "Role or permission not found"),
            other => internal_error("Permission grant failed", other),
        })?;

    Ok(Json(grant))
}

pub async fn revoke_permission(
    State(state): State<Arc<AppState>>,
    Path((id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let deleted = diesel::delete(
        role_permissions::table
            .filter(role_permissions::role_id.eq(id))
            .filter(role_permissions::permission_id.eq(permission_id)),
    )
    .execute(&mut conn)
    .map_err(|e| internal_error("Permission revoke failed", e))?;

    if deleted == 0 {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "Permission grant not found",
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

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

use crate::shared::models::{Role, User};
use crate::shared::schema::{roles, users};
use crate::shared::state::AppState;
use crate::shared::{api_error, db_unavailable, internal_error, ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub employee_id: String,
    pub name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub role_id: Option<Uuid>,
    pub goal_daily: Option<i32>,
    pub goal_weekly: Option<i32>,
    pub goal_monthly: Option<i32>,
    pub goal_quarterly: Option<i32>,
    pub goal_yearly: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub goal_daily: Option<i32>,
    pub goal_weekly: Option<i32>,
    pub goal_monthly: Option<i32>,
    pub goal_quarterly: Option<i32>,
    pub goal_yearly: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub department: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: User,
    pub role: Option<Role>,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    if req.employee_id.trim().is_empty() || req.name.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "employee_id and name are required",
        ));
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        employee_id: req.employee_id.trim().to_string(),
        name: req.name.trim().to_string(),
        email: req.email,
        department: req.department,
        role_id: req.role_id,
        is_active: true,
        external_source: None,
        last_sync_at: None,
        goal_daily: req.goal_daily.unwrap_or(0),
        goal_weekly: req.goal_weekly.unwrap_or(0),
        goal_monthly: req.goal_monthly.unwrap_or(0),
        goal_quarterly: req.goal_quarterly.unwrap_or(0),
        goal_yearly: req.goal_yearly.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => api_error(
                StatusCode::CONFLICT,
                "A user with this employee id already exists",
            ),
            other => internal_error("User insert failed", other),
        })?;

    log::info!("Created user {} ({})", user.name, user.employee_id);
    Ok(Json(user))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut q = users::table.into_boxed();
    if let Some(is_active) = query.is_active {
        q = q.filter(users::is_active.eq(is_active));
    }
    if let Some(department) = query.department {
        q = q.filter(users::department.eq(department));
    }
    if let Some(search) = query.search {
        let pattern = format!("%{search}%");
        q = q.filter(
            users::name
                .ilike(pattern.clone())
                .or(users::employee_id.ilike(pattern.clone()))
                .or(users::email.ilike(pattern)),
        );
    }

    let rows: Vec<User> = q
        .order(users::name.asc())
        .limit(query.limit.unwrap_or(100))
        .offset(query.offset.unwrap_or(0))
        .load(&mut conn)
        .map_err(|e| internal_error("User query failed", e))?;
    Ok(Json(rows))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserWithRole>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let user: User = users::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("User query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "User not found"))?;

    let role: Option<Role> = match user.role_id {
        Some(role_id) => roles::table
            .find(role_id)
            .first(&mut conn)
            .optional()
            .map_err(|e| internal_error("Role query failed", e))?,
        None => None,
    };

    Ok(Json(UserWithRole { user, role }))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut user: User = users::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("User query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "User not found"))?;

    if let Some(name) = req.name {
        user.name = name;
    }
    if let Some(email) = req.email {
        user.email = Some(email);
    }
    if let Some(department) = req.department {
        user.department = Some(department);
    }
    if let Some(role_id) = req.role_id {
        user.role_id = Some(role_id);
    }
    if let Some(is_active) = req.is_active {
        user.is_active = is_active;
    }
    if let Some(goal) = req.goal_daily {
        user.goal_daily = goal;
    }
    if let Some(goal) = req.goal_weekly {
        user.goal_weekly = goal;
    }
    if let Some(goal) = req.goal_monthly {
        user.goal_monthly = goal;
    }
    if let Some(goal) = req.goal_quarterly {
        user.goal_quarterly = goal;
    }
    if let Some(goal) = req.goal_yearly {
        user.goal_yearly = goal;
    }
    user.updated_at = Utc::now();

    diesel::update(users::table.find(id))
        .set(&user)
        .execute(&mut conn)
        .map_err(|e| internal_error("User update failed", e))?;

    Ok(Json(user))
}

/// Soft delete: deactivates rather than removing, preserving observation
/// history.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let updated: User = diesel::update(users::table.find(id))
        .set((users::is_active.eq(false), users::updated_at.eq(Utc::now())))
        .get_result(&mut conn)
        .optional()
        .map_err(|e| internal_error("User deactivation failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "User not found"))?;

    log::info!("Deactivated user {id}");
    Ok(Json(updated))
}

//! User and role directory.

pub mod roles;
pub mod users;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_directory_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/api/roles/:id",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route(
            "/api/roles/:id/permissions",
            post(roles::grant_permission),
        )
        .route(
            "/api/roles/:id/permissions/:permission_id",
            delete(roles::revoke_permission),
        )
        .route(
            "/api/permissions",
            get(roles::list_permissions).post(roles::create_permission),
        )
}

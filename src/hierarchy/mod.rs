//! Organizational hierarchy: organization → facility → department → area.

pub mod areas;
pub mod departments;
pub mod facilities;
pub mod organizations;

use axum::http::StatusCode;
use axum::{routing::get, Router};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::Arc;

use crate::shared::state::AppState;
use crate::shared::{api_error, internal_error, ApiError};

/// FK violations on delete and unique violations on create surface as 409
/// conflicts rather than opaque 500s.
pub(crate) fn conflict_or_internal(e: DieselError, conflict_message: &str, context: &str) -> ApiError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
        | DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            api_error(StatusCode::CONFLICT, conflict_message.to_string())
        }
        other => internal_error(context, other),
    }
}

pub fn configure_hierarchy_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route(
            "/api/organizations/:id",
            get(organizations::get_organization)
                .put(organizations::update_organization)
                .delete(organizations::delete_organization),
        )
        .route(
            "/api/facilities",
            get(facilities::list_facilities).post(facilities::create_facility),
        )
        .route(
            "/api/facilities/:id",
            get(facilities::get_facility)
                .put(facilities::update_facility)
                .delete(facilities::delete_facility),
        )
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/api/departments/:id",
            get(departments::get_department)
                .put(departments::update_department)
                .delete(departments::delete_department),
        )
        .route(
            "/api/areas",
            get(areas::list_areas).post(areas::create_area),
        )
        .route(
            "/api/areas/:id",
            get(areas::get_area)
                .put(areas::update_area)
                .delete(areas::delete_area),
        )
}

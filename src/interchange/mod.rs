//! CSV interchange: template generation, parsing, validation, row
//! transformation, bulk import, and per-table export.

pub mod codec;
pub mod export;
pub mod import;
pub mod template;
pub mod transform;
pub mod validate;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::shared::state::AppState;

/// Repeated column-group bounds in the standard import template.
pub const MAX_UOM_SLOTS: usize = 75;
pub const MAX_BEST_PRACTICES: usize = 20;
pub const MAX_PROCESS_OPPORTUNITIES: usize = 20;

/// Fixed hierarchy columns, in template order.
pub const HIERARCHY_COLUMNS: [&str; 9] = [
    "organizationName",
    "organizationCode",
    "facilityName",
    "facilityRef",
    "facilityCity",
    "departmentName",
    "areaName",
    "standardName",
    "notes",
];

/// 1-indexed physical CSV line for a 0-indexed data row (line 1 is the
/// header). Import and validation errors both use this numbering.
pub fn display_row(data_index: usize) -> usize {
    data_index + 2
}

pub fn configure_interchange_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/import/csv", post(import::import_csv))
        .route(
            "/api/export/csv",
            get(export::export_csv).post(export::export_csv_post),
        )
        .route("/api/standards/template", get(template::download_template))
        .route("/api/standards/import", post(import::import_standards_csv))
}

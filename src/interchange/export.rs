//! Per-table CSV export. Column names mirror the import headers so an export
//! can be re-imported unchanged.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::models::{
    Area, Department, Facility, Observation, Organization, Standard, UomEntry, User,
};
use crate::shared::schema::{
    areas, departments, facilities, observations, organizations, standards, uom_entries, users,
};
use crate::shared::state::AppState;
use crate::shared::{api_error, internal_error, ApiError};

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub table: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UomEntryExport {
    uom: String,
    description: String,
    sam_value: f64,
    tags: Vec<String>,
}

pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(request): Query<ExportRequest>,
) -> Result<Response, ApiError> {
    export_table(&state, &request.table)
}

pub async fn export_csv_post(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    export_table(&state, &request.table)
}

fn export_table(state: &AppState, table: &str) -> Result<Response, ApiError> {
    let mut conn = state
        .conn
        .get()
        .map_err(|e| crate::shared::db_unavailable(e))?;

    let (headers, rows) = match table {
        "organizations" => export_organizations(&mut conn),
        "facilities" => export_facilities(&mut conn),
        "departments" => export_departments(&mut conn),
        "areas" => export_areas(&mut conn),
        "standards" => export_standards(&mut conn),
        "users" => export_users(&mut conn),
        "observations" => export_observations(&mut conn),
        other => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Unknown export table '{other}'"),
            ))
        }
    }
    .map_err(|e| internal_error("Export query failed", e))?;

    let body = write_csv(&headers, &rows).map_err(|e| internal_error("CSV write failed", e))?;
    let filename = format!("{table}-export-{}.csv", Utc::now().format("%Y-%m-%d"));
    log::info!("Exported {} rows from {table}", rows.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

fn write_csv(headers: &[&str], rows: &[Vec<String>]) -> Result<String, anyhow::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

type TableDump = (Vec<&'static str>, Vec<Vec<String>>);

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn export_organizations(conn: &mut PgConnection) -> Result<TableDump, diesel::result::Error> {
    let rows: Vec<Organization> = organizations::table
        .order(organizations::name.asc())
        .load(conn)?;
    Ok((
        vec!["organizationName", "organizationCode", "logo"],
        rows.into_iter()
            .map(|o| vec![o.name, o.code, o.logo.unwrap_or_default()])
            .collect(),
    ))
}

fn export_facilities(conn: &mut PgConnection) -> Result<TableDump, diesel::result::Error> {
    let rows: Vec<(Facility, Organization)> = facilities::table
        .inner_join(organizations::table)
        .order(facilities::name.asc())
        .load(conn)?;
    Ok((
        vec![
            "organizationName",
            "organizationCode",
            "facilityName",
            "facilityRef",
            "facilityCity",
        ],
        rows.into_iter()
            .map(|(f, o)| {
                vec![o.name, o.code, f.name, opt(&f.ref_code), opt(&f.city)]
            })
            .collect(),
    ))
}

fn export_departments(conn: &mut PgConnection) -> Result<TableDump, diesel::result::Error> {
    let rows: Vec<(Department, (Facility, Organization))> = departments::table
        .inner_join(facilities::table.inner_join(organizations::table))
        .order(departments::name.asc())
        .load(conn)?;
    Ok((
        vec!["organizationName", "facilityName", "departmentName"],
        rows.into_iter()
            .map(|(d, (f, o))| vec![o.name, f.name, d.name])
            .collect(),
    ))
}

fn export_areas(conn: &mut PgConnection) -> Result<TableDump, diesel::result::Error> {
    let rows: Vec<(Area, (Department, (Facility, Organization)))> = areas::table
        .inner_join(
            departments::table.inner_join(facilities::table.inner_join(organizations::table)),
        )
        .order(areas::name.asc())
        .load(conn)?;
    Ok((
        vec![
            "organizationName",
            "facilityName",
            "departmentName",
            "areaName",
        ],
        rows.into_iter()
            .map(|(a, (d, (f, o)))| vec![o.name, f.name, d.name, a.name])
            .collect(),
    ))
}

fn export_standards(conn: &mut PgConnection) -> Result<TableDump, diesel::result::Error> {
    let rows: Vec<(Standard, (Area, (Department, (Facility, Organization))))> = standards::table
        .inner_join(areas::table.inner_join(
            departments::table.inner_join(facilities::table.inner_join(organizations::table)),
        ))
        .order(standards::name.asc())
        .load(conn)?;

    let ids: Vec<Uuid> = rows.iter().map(|(s, _)| s.id).collect();
    let mut uoms_by_standard: HashMap<Uuid, Vec<UomEntryExport>> = HashMap::new();
    let uoms: Vec<UomEntry> = uom_entries::table
        .filter(uom_entries::standard_id.eq_any(&ids))
        .load(conn)?;
    for entry in uoms {
        uoms_by_standard
            .entry(entry.standard_id)
            .or_default()
            .push(UomEntryExport {
                uom: entry.uom,
                description: entry.description,
                sam_value: entry.sam_value,
                tags: entry.tags,
            });
    }

    Ok((
        vec![
            "organizationName",
            "organizationCode",
            "facilityName",
            "departmentName",
            "areaName",
            "standardName",
            "notes",
            "version",
            "isCurrentVersion",
            "isActive",
            "bestPractices",
            "processOpportunities",
            "uomEntries",
        ],
        rows.into_iter()
            .map(|(s, (a, (d, (f, o))))| {
                let uoms = uoms_by_standard.remove(&s.id).unwrap_or_default();
                vec![
                    o.name,
                    o.code,
                    f.name,
                    d.name,
                    a.name,
                    s.name,
                    s.version_notes.unwrap_or_default(),
                    s.version.to_string(),
                    s.is_current_version.to_string(),
                    s.is_active.to_string(),
                    s.best_practices.join(";"),
                    s.process_opportunities.join(";"),
                    serde_json::to_string(&uoms).unwrap_or_else(|_| "[]".to_string()),
                ]
            })
            .collect(),
    ))
}

fn export_users(conn: &mut PgConnection) -> Result<TableDump, diesel::result::Error> {
    let rows: Vec<User> = users::table.order(users::employee_id.asc()).load(conn)?;
    Ok((
        vec!["employeeId", "name", "email", "department", "isActive"],
        rows.into_iter()
            .map(|u| {
                vec![
                    u.employee_id,
                    u.name,
                    opt(&u.email),
                    opt(&u.department),
                    u.is_active.to_string(),
                ]
            })
            .collect(),
    ))
}

fn export_observations(conn: &mut PgConnection) -> Result<TableDump, diesel::result::Error> {
    let rows: Vec<(Observation, User, Standard)> = observations::table
        .inner_join(users::table)
        .inner_join(standards::table)
        .order(observations::created_at.desc())
        .load(conn)?;
    Ok((
        vec![
            "employeeId",
            "standardName",
            "timeObserved",
            "totalSams",
            "observedPerformance",
            "pumpScore",
            "pace",
            "utilization",
            "methods",
            "observationReason",
            "startedAt",
            "endedAt",
            "isFinalized",
        ],
        rows.into_iter()
            .map(|(obs, user, standard)| {
                vec![
                    user.employee_id,
                    standard.name,
                    obs.time_observed.to_string(),
                    obs.total_sams.to_string(),
                    obs.observed_performance.to_string(),
                    obs.pump_score.to_string(),
                    obs.pace.to_string(),
                    obs.utilization.to_string(),
                    obs.methods.to_string(),
                    obs.observation_reason,
                    obs.started_at.to_rfc3339(),
                    obs.ended_at.to_rfc3339(),
                    obs.is_finalized.to_string(),
                ]
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_csv_quotes_embedded_delimiters() {
        let body = write_csv(
            &["name", "notes"],
            &[vec!["Acme".to_string(), "a,b".to_string()]],
        )
        .unwrap();
        assert_eq!(body, "name,notes\nAcme,\"a,b\"\n");
    }
}

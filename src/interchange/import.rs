//! Bulk CSV import.
//!
//! Two entry points share the hierarchy resolver: `/api/import/csv` imports a
//! chosen table into a caller-supplied target database, resolving each
//! hierarchy level by name before inserting the next; `/api/standards/import`
//! ingests template-format rows (validate, transform, resolve, insert) into
//! the application database.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::models::{Area, Department, Facility, Organization, Standard, UomEntry, User};
use crate::shared::schema::{
    areas, departments, facilities, organizations, standards, uom_entries, users,
};
use crate::shared::state::AppState;
use crate::shared::utils::establish_pg_connection;
use crate::shared::{api_error, ApiError};

use super::codec::parse_csv_content;
use super::display_row;
use super::transform::{split_tags, transform_row_to_standard_data, UomEntryData};
use super::validate::validate_standard_row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTable {
    Organizations,
    Facilities,
    Departments,
    Areas,
    Standards,
    Users,
}

impl ImportTable {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "organizations" => Some(Self::Organizations),
            "facilities" => Some(Self::Facilities),
            "departments" => Some(Self::Departments),
            "areas" => Some(Self::Areas),
            "standards" => Some(Self::Standards),
            "users" => Some(Self::Users),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub imported: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ImportResult {
    fn new(imported: usize, total: usize, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            success: errors.is_empty(),
            imported,
            total,
            errors: if errors.is_empty() { None } else { Some(errors) },
            warnings: if warnings.is_empty() {
                None
            } else {
                Some(warnings)
            },
        }
    }
}

/// Embedded `uomEntries` JSON column shape on cross-database standards rows.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UomEntryJson {
    uom: String,
    #[serde(default)]
    description: String,
    sam_value: f64,
    #[serde(default)]
    tags: Vec<String>,
}

fn field(row: &HashMap<String, String>, key: &str) -> String {
    row.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn required(row: &HashMap<String, String>, key: &str, display_row: usize) -> Result<String, String> {
    let value = field(row, key);
    if value.is_empty() {
        return Err(format!("Row {display_row}: {key} is required"));
    }
    Ok(value)
}

/// Blank or absent flag columns default to true.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "" => default,
        "true" | "t" | "1" | "yes" => true,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Hierarchy resolution (strict order, contextual errors)
// ---------------------------------------------------------------------------

pub fn find_organization(
    conn: &mut PgConnection,
    name: &str,
    code: &str,
) -> Result<Organization, String> {
    let mut query = organizations::table.into_boxed();
    if code.is_empty() {
        query = query.filter(organizations::name.eq(name.to_string()));
    } else {
        query = query.filter(
            organizations::name
                .eq(name.to_string())
                .or(organizations::code.eq(code.to_string())),
        );
    }
    match query.first::<Organization>(conn).optional() {
        Ok(Some(org)) => Ok(org),
        Ok(None) => Err(format!("Organization '{name}' not found")),
        Err(e) => Err(format!("Organization lookup failed: {e}")),
    }
}

pub fn find_facility(
    conn: &mut PgConnection,
    organization: &Organization,
    name: &str,
) -> Result<Facility, String> {
    match facilities::table
        .filter(facilities::organization_id.eq(organization.id))
        .filter(facilities::name.eq(name.to_string()))
        .first::<Facility>(conn)
        .optional()
    {
        Ok(Some(facility)) => Ok(facility),
        Ok(None) => Err(format!(
            "Facility '{name}' not found in organization '{}'",
            organization.name
        )),
        Err(e) => Err(format!("Facility lookup failed: {e}")),
    }
}

pub fn find_department(
    conn: &mut PgConnection,
    facility: &Facility,
    name: &str,
) -> Result<Department, String> {
    match departments::table
        .filter(departments::facility_id.eq(facility.id))
        .filter(departments::name.eq(name.to_string()))
        .first::<Department>(conn)
        .optional()
    {
        Ok(Some(department)) => Ok(department),
        Ok(None) => Err(format!(
            "Department '{name}' not found in facility '{}'",
            facility.name
        )),
        Err(e) => Err(format!("Department lookup failed: {e}")),
    }
}

pub fn find_area(
    conn: &mut PgConnection,
    department: &Department,
    name: &str,
) -> Result<Area, String> {
    match areas::table
        .filter(areas::department_id.eq(department.id))
        .filter(areas::name.eq(name.to_string()))
        .first::<Area>(conn)
        .optional()
    {
        Ok(Some(area)) => Ok(area),
        Ok(None) => Err(format!(
            "Area '{name}' not found in department '{}'",
            department.name
        )),
        Err(e) => Err(format!("Area lookup failed: {e}")),
    }
}

struct ResolvedHierarchy {
    facility_id: Uuid,
    department_id: Uuid,
    area_id: Uuid,
}

fn resolve_hierarchy(
    conn: &mut PgConnection,
    organization_name: &str,
    organization_code: &str,
    facility_name: &str,
    department_name: &str,
    area_name: &str,
) -> Result<ResolvedHierarchy, String> {
    let organization = find_organization(conn, organization_name, organization_code)?;
    let facility = find_facility(conn, &organization, facility_name)?;
    let department = find_department(conn, &facility, department_name)?;
    let area = find_area(conn, &department, area_name)?;
    Ok(ResolvedHierarchy {
        facility_id: facility.id,
        department_id: department.id,
        area_id: area.id,
    })
}

// ---------------------------------------------------------------------------
// Per-table row import (upsert on the natural key)
// ---------------------------------------------------------------------------

fn import_organization_row(
    conn: &mut PgConnection,
    row: &HashMap<String, String>,
    display_row: usize,
) -> Result<(), String> {
    let name = required(row, "organizationName", display_row)?;
    let code = required(row, "organizationCode", display_row)?;
    let logo = field(row, "logo");
    let now = Utc::now();

    let org = Organization {
        id: Uuid::new_v4(),
        name,
        code,
        logo: if logo.is_empty() { None } else { Some(logo) },
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(organizations::table)
        .values(&org)
        .on_conflict(organizations::code)
        .do_update()
        .set((
            organizations::name.eq(&org.name),
            organizations::logo.eq(&org.logo),
            organizations::updated_at.eq(now),
        ))
        .execute(conn)
        .map_err(|e| format!("Row {display_row}: failed to import organization: {e}"))?;
    Ok(())
}

fn import_facility_row(
    conn: &mut PgConnection,
    row: &HashMap<String, String>,
    display_row: usize,
) -> Result<(), String> {
    let organization_name = required(row, "organizationName", display_row)?;
    let name = required(row, "facilityName", display_row)?;
    let organization = find_organization(conn, &organization_name, &field(row, "organizationCode"))
        .map_err(|e| format!("Row {display_row}: {e}"))?;

    let ref_code = field(row, "facilityRef");
    let city = field(row, "facilityCity");
    let now = Utc::now();

    let facility = Facility {
        id: Uuid::new_v4(),
        name,
        ref_code: if ref_code.is_empty() { None } else { Some(ref_code) },
        city: if city.is_empty() { None } else { Some(city) },
        organization_id: organization.id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(facilities::table)
        .values(&facility)
        .on_conflict((facilities::organization_id, facilities::name))
        .do_update()
        .set((
            facilities::ref_code.eq(&facility.ref_code),
            facilities::city.eq(&facility.city),
            facilities::updated_at.eq(now),
        ))
        .execute(conn)
        .map_err(|e| format!("Row {display_row}: failed to import facility: {e}"))?;
    Ok(())
}

fn import_department_row(
    conn: &mut PgConnection,
    row: &HashMap<String, String>,
    display_row: usize,
) -> Result<(), String> {
    let organization_name = required(row, "organizationName", display_row)?;
    let facility_name = required(row, "facilityName", display_row)?;
    let name = required(row, "departmentName", display_row)?;

    let organization = find_organization(conn, &organization_name, &field(row, "organizationCode"))
        .map_err(|e| format!("Row {display_row}: {e}"))?;
    let facility = find_facility(conn, &organization, &facility_name)
        .map_err(|e| format!("Row {display_row}: {e}"))?;

    let now = Utc::now();
    let department = Department {
        id: Uuid::new_v4(),
        name,
        facility_id: facility.id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(departments::table)
        .values(&department)
        .on_conflict((departments::facility_id, departments::name))
        .do_update()
        .set(departments::updated_at.eq(now))
        .execute(conn)
        .map_err(|e| format!("Row {display_row}: failed to import department: {e}"))?;
    Ok(())
}

fn import_area_row(
    conn: &mut PgConnection,
    row: &HashMap<String, String>,
    display_row: usize,
) -> Result<(), String> {
    let organization_name = required(row, "organizationName", display_row)?;
    let facility_name = required(row, "facilityName", display_row)?;
    let department_name = required(row, "departmentName", display_row)?;
    let name = required(row, "areaName", display_row)?;

    let organization = find_organization(conn, &organization_name, &field(row, "organizationCode"))
        .map_err(|e| format!("Row {display_row}: {e}"))?;
    let facility = find_facility(conn, &organization, &facility_name)
        .map_err(|e| format!("Row {display_row}: {e}"))?;
    let department = find_department(conn, &facility, &department_name)
        .map_err(|e| format!("Row {display_row}: {e}"))?;

    let now = Utc::now();
    let area = Area {
        id: Uuid::new_v4(),
        name,
        department_id: department.id,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(areas::table)
        .values(&area)
        .on_conflict((areas::department_id, areas::name))
        .do_update()
        .set(areas::updated_at.eq(now))
        .execute(conn)
        .map_err(|e| format!("Row {display_row}: failed to import area: {e}"))?;
    Ok(())
}

fn import_standard_row(
    conn: &mut PgConnection,
    row: &HashMap<String, String>,
    display_row: usize,
) -> Result<(), String> {
    let organization_name = required(row, "organizationName", display_row)?;
    let facility_name = required(row, "facilityName", display_row)?;
    let department_name = required(row, "departmentName", display_row)?;
    let area_name = required(row, "areaName", display_row)?;
    let name = required(row, "standardName", display_row)?;

    let resolved = resolve_hierarchy(
        conn,
        &organization_name,
        &field(row, "organizationCode"),
        &facility_name,
        &department_name,
        &area_name,
    )
    .map_err(|e| format!("Row {display_row}: {e}"))?;

    let version = field(row, "version").parse::<i32>().unwrap_or(1).max(1);
    let notes = field(row, "notes");
    let created_by = field(row, "createdBy");
    let now = Utc::now();

    let standard = Standard {
        id: Uuid::new_v4(),
        name,
        facility_id: resolved.facility_id,
        department_id: resolved.department_id,
        area_id: resolved.area_id,
        version,
        base_standard_id: None,
        is_current_version: parse_flag(&field(row, "isCurrentVersion"), true),
        is_active: parse_flag(&field(row, "isActive"), true),
        best_practices: split_tags(&field(row, "bestPractices")),
        process_opportunities: split_tags(&field(row, "processOpportunities")),
        version_notes: if notes.is_empty() { None } else { Some(notes) },
        created_by: if created_by.is_empty() {
            None
        } else {
            Some(created_by)
        },
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(standards::table)
        .values(&standard)
        .execute(conn)
        .map_err(|e| format!("Row {display_row}: failed to import standard: {e}"))?;

    // Malformed embedded UOM JSON degrades to a warning: the standard row
    // stays, only its UOM entries are skipped.
    let uom_raw = field(row, "uomEntries");
    if !uom_raw.is_empty() {
        match serde_json::from_str::<Vec<UomEntryJson>>(&uom_raw) {
            Ok(entries) => {
                for entry in entries {
                    let uom = UomEntry {
                        id: Uuid::new_v4(),
                        uom: entry.uom,
                        description: entry.description,
                        sam_value: entry.sam_value,
                        tags: entry.tags,
                        standard_id: standard.id,
                        created_at: now,
                    };
                    diesel::insert_into(uom_entries::table)
                        .values(&uom)
                        .execute(conn)
                        .map_err(|e| {
                            format!("Row {display_row}: failed to import UOM entry: {e}")
                        })?;
                }
            }
            Err(e) => warn!(
                "Row {display_row}: skipping malformed uomEntries JSON for standard '{}': {e}",
                standard.name
            ),
        }
    }
    Ok(())
}

fn import_user_row(
    conn: &mut PgConnection,
    row: &HashMap<String, String>,
    display_row: usize,
) -> Result<(), String> {
    let employee_id = required(row, "employeeId", display_row)?;
    let name = required(row, "name", display_row)?;
    let email = field(row, "email");
    let department = field(row, "department");
    let now = Utc::now();

    let user = User {
        id: Uuid::new_v4(),
        employee_id,
        name,
        email: if email.is_empty() { None } else { Some(email) },
        department: if department.is_empty() {
            None
        } else {
            Some(department)
        },
        role_id: None,
        is_active: parse_flag(&field(row, "isActive"), true),
        external_source: None,
        last_sync_at: None,
        goal_daily: 0,
        goal_weekly: 0,
        goal_monthly: 0,
        goal_quarterly: 0,
        goal_yearly: 0,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(users::table)
        .values(&user)
        .on_conflict(users::employee_id)
        .do_update()
        .set((
            users::name.eq(&user.name),
            users::email.eq(&user.email),
            users::department.eq(&user.department),
            users::is_active.eq(user.is_active),
            users::updated_at.eq(now),
        ))
        .execute(conn)
        .map_err(|e| format!("Row {display_row}: failed to import user: {e}"))?;
    Ok(())
}

fn import_row(
    conn: &mut PgConnection,
    table: ImportTable,
    row: &HashMap<String, String>,
    display_row: usize,
) -> Result<(), String> {
    match table {
        ImportTable::Organizations => import_organization_row(conn, row, display_row),
        ImportTable::Facilities => import_facility_row(conn, row, display_row),
        ImportTable::Departments => import_department_row(conn, row, display_row),
        ImportTable::Areas => import_area_row(conn, row, display_row),
        ImportTable::Standards => import_standard_row(conn, row, display_row),
        ImportTable::Users => import_user_row(conn, row, display_row),
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// `POST /api/import/csv`: multipart `file` + `tableType` + `databaseUrl`
/// (the legacy `neonDatabaseUrl` field name is accepted as an alias). Rows
/// process sequentially and independently; one row's failure never aborts its
/// siblings.
pub async fn import_csv(mut multipart: Multipart) -> Result<Json<ImportResult>, ApiError> {
    let mut file_text: Option<String> = None;
    let mut table_type: Option<String> = None;
    let mut database_url: Option<String> = None;

    while let Some(part) = multipart.next_field().await.map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Malformed multipart request: {e}"),
        )
    })? {
        let name = part.name().unwrap_or("").to_string();
        let value = part.text().await.map_err(|e| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Unreadable multipart field '{name}': {e}"),
            )
        })?;
        match name.as_str() {
            "file" => file_text = Some(value),
            "tableType" => table_type = Some(value),
            "databaseUrl" | "neonDatabaseUrl" => database_url = Some(value),
            _ => {}
        }
    }

    let file_text =
        file_text.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'file' field"))?;
    let table_type =
        table_type.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'tableType' field"))?;
    let table = ImportTable::parse(&table_type).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Unknown tableType '{table_type}'"),
        )
    })?;
    let database_url = database_url.ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "A target database connection string is required",
        )
    })?;

    let mut conn = establish_pg_connection(&database_url).map_err(|e| {
        log::error!("Import target connection failed: {e}");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to connect to target database",
        )
    })?;

    let rows = parse_csv_content(&file_text)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut imported = 0usize;
    let mut errors = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match import_row(&mut conn, table, row, display_row(i)) {
            Ok(()) => imported += 1,
            Err(message) => errors.push(message),
        }
    }

    log::info!(
        "CSV import of {table_type}: {imported}/{} rows, {} errors",
        rows.len(),
        errors.len()
    );
    Ok(Json(ImportResult::new(imported, rows.len(), errors, Vec::new())))
}

/// `POST /api/standards/import`: template-format rows into the application
/// database. Parse, validate, transform, resolve the hierarchy by name,
/// insert the standard and its UOM entries.
pub async fn import_standards_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImportResult>, ApiError> {
    let mut file_text: Option<String> = None;
    while let Some(part) = multipart.next_field().await.map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Malformed multipart request: {e}"),
        )
    })? {
        if part.name() == Some("file") {
            file_text = Some(part.text().await.map_err(|e| {
                api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unreadable multipart field 'file': {e}"),
                )
            })?);
        }
    }
    let file_text =
        file_text.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'file' field"))?;

    let rows = parse_csv_content(&file_text)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut conn = state
        .conn
        .get()
        .map_err(|e| crate::shared::db_unavailable(e))?;

    let mut imported = 0usize;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let line = display_row(i);
        let validation = validate_standard_row(row, line);
        warnings.extend(validation.warnings.iter().cloned());
        if !validation.is_valid() {
            errors.extend(validation.errors);
            continue;
        }

        let data = transform_row_to_standard_data(row);
        let resolved = match resolve_hierarchy(
            &mut conn,
            &data.organization_name,
            &data.organization_code,
            &data.facility_name,
            &data.department_name,
            &data.area_name,
        ) {
            Ok(resolved) => resolved,
            Err(e) => {
                errors.push(format!("Row {line}: {e}"));
                continue;
            }
        };

        match insert_standard(&mut conn, &resolved, &data) {
            Ok(()) => imported += 1,
            Err(e) => errors.push(format!("Row {line}: failed to create standard: {e}")),
        }
    }

    log::info!(
        "Standards CSV import: {imported}/{} rows, {} errors",
        rows.len(),
        errors.len()
    );
    Ok(Json(ImportResult::new(imported, rows.len(), errors, warnings)))
}

fn insert_standard(
    conn: &mut PgConnection,
    resolved: &ResolvedHierarchy,
    data: &super::transform::StandardImportData,
) -> Result<(), diesel::result::Error> {
    let now = Utc::now();
    let standard = Standard {
        id: Uuid::new_v4(),
        name: data.standard_name.clone(),
        facility_id: resolved.facility_id,
        department_id: resolved.department_id,
        area_id: resolved.area_id,
        version: 1,
        base_standard_id: None,
        is_current_version: true,
        is_active: true,
        best_practices: data.best_practices.clone(),
        process_opportunities: data.process_opportunities.clone(),
        version_notes: if data.notes.is_empty() {
            None
        } else {
            Some(data.notes.clone())
        },
        created_by: None,
        created_at: now,
        updated_at: now,
    };

    conn.transaction(|conn| {
        diesel::insert_into(standards::table)
            .values(&standard)
            .execute(conn)?;
        for entry in &data.uom_entries {
            insert_uom_entry(conn, standard.id, entry)?;
        }
        Ok(())
    })
}

pub fn insert_uom_entry(
    conn: &mut PgConnection,
    standard_id: Uuid,
    entry: &UomEntryData,
) -> Result<(), diesel::result::Error> {
    let uom = UomEntry {
        id: Uuid::new_v4(),
        uom: entry.uom.clone(),
        description: entry.description.clone(),
        sam_value: entry.sam_value,
        tags: entry.tags.clone(),
        standard_id,
        created_at: Utc::now(),
    };
    diesel::insert_into(uom_entries::table)
        .values(&uom)
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_type_parsing() {
        assert_eq!(
            ImportTable::parse("standards"),
            Some(ImportTable::Standards)
        );
        assert_eq!(ImportTable::parse("widgets"), None);
    }

    #[test]
    fn flag_parsing_defaults_blank() {
        assert!(parse_flag("", true));
        assert!(!parse_flag("", false));
        assert!(parse_flag("TRUE", false));
        assert!(parse_flag("1", false));
        assert!(!parse_flag("false", true));
        assert!(!parse_flag("0", true));
    }

    #[test]
    fn uom_entry_json_accepts_camel_case() {
        let parsed: Vec<UomEntryJson> = serde_json::from_str(
            r#"[{"uom":"Case","description":"Sealed case","samValue":0.45,"tags":["pack"]}]"#,
        )
        .unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].uom, "Case");
        assert!((parsed[0].sam_value - 0.45).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_uom_entry_json_is_an_error() {
        let parsed = serde_json::from_str::<Vec<UomEntryJson>>("not json");
        assert!(parsed.is_err());
    }

    #[test]
    fn required_field_reports_display_row() {
        let row = HashMap::new();
        let err = required(&row, "organizationName", 3).unwrap_err();
        assert_eq!(err, "Row 3: organizationName is required");
    }
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use super::schema;

pub use super::schema::{
    areas, departments, facilities, observation_data, observations, organizations, permissions,
    role_permissions, roles, standards, uom_entries, users,
};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = organizations)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = facilities)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub ref_code: Option<String>,
    pub city: Option<String>,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = departments)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub facility_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = areas)]
pub struct Area {
    pub id: Uuid,
    pub name: String,
    pub department_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row in a standard's version family. `base_standard_id` is null on the
/// family root and points at the root on every later version; exactly one row
/// per family carries `is_current_version = true`.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = standards)]
pub struct Standard {
    pub id: Uuid,
    pub name: String,
    pub facility_id: Uuid,
    pub department_id: Uuid,
    pub area_id: Uuid,
    pub version: i32,
    pub base_standard_id: Option<Uuid>,
    pub is_current_version: bool,
    pub is_active: bool,
    pub best_practices: Vec<String>,
    pub process_opportunities: Vec<String>,
    pub version_notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Identifiable)]
#[diesel(table_name = uom_entries)]
pub struct UomEntry {
    pub id: Uuid,
    pub uom: String,
    pub description: String,
    pub sam_value: f64,
    pub tags: Vec<String>,
    pub standard_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = roles)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Identifiable)]
#[diesel(table_name = permissions)]
pub struct Permission {
    pub id: Uuid,
    pub module: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Identifiable)]
#[diesel(table_name = role_permissions)]
pub struct RolePermission {
    pub id: Uuid,
    pub role_id: Uuid,
    pub permission_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub employee_id: String,
    pub name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: bool,
    pub external_source: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub goal_daily: i32,
    pub goal_weekly: i32,
    pub goal_monthly: i32,
    pub goal_quarterly: i32,
    pub goal_yearly: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset, Identifiable)]
#[diesel(table_name = observations)]
pub struct Observation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub standard_id: Uuid,
    pub time_observed: f64,
    pub total_sams: f64,
    pub observed_performance: f64,
    pub pump_score: f64,
    pub pace: f64,
    pub utilization: f64,
    pub methods: f64,
    pub comments: Option<String>,
    pub best_practices_checked: Vec<String>,
    pub process_adherence_checked: Vec<String>,
    pub delays: serde_json::Value,
    pub observation_reason: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub is_finalized: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Identifiable)]
#[diesel(table_name = observation_data)]
pub struct ObservationDataRow {
    pub id: Uuid,
    pub observation_id: Uuid,
    pub uom: String,
    pub description: String,
    pub quantity: i32,
    pub sam_value: f64,
    pub total_sams: f64,
    pub created_at: DateTime<Utc>,
}

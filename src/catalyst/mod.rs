//! Goal sync pushed from the external Catalyst workforce system. Items match
//! users by employee id; unknown ids are collected per item, in the same
//! result envelope the CSV import uses.

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::shared::models::User;
use crate::shared::schema::users;
use crate::shared::state::AppState;
use crate::shared::{db_unavailable, ApiError};

pub const CATALYST_SOURCE: &str = "catalyst";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSyncItem {
    pub employee_id: String,
    pub daily: Option<i32>,
    pub weekly: Option<i32>,
    pub monthly: Option<i32>,
    pub quarterly: Option<i32>,
    pub yearly: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct GoalSyncRequest {
    pub goals: Vec<GoalSyncItem>,
}

#[derive(Debug, Serialize)]
pub struct GoalSyncResult {
    pub success: bool,
    pub updated: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

fn apply_goal_item(
    conn: &mut PgConnection,
    item: &GoalSyncItem,
    now: DateTime<Utc>,
) -> Result<(), String> {
    let mut user: User = users::table
        .filter(users::employee_id.eq(&item.employee_id))
        .first(conn)
        .optional()
        .map_err(|e| format!("Lookup failed for '{}': {e}", item.employee_id))?
        .ok_or_else(|| format!("No user with employee id '{}'", item.employee_id))?;

    if let Some(goal) = item.daily {
        user.goal_daily = goal;
    }
    if let Some(goal) = item.weekly {
        user.goal_weekly = goal;
    }
    if let Some(goal) = item.monthly {
        user.goal_monthly = goal;
    }
    if let Some(goal) = item.quarterly {
        user.goal_quarterly = goal;
    }
    if let Some(goal) = item.yearly {
        user.goal_yearly = goal;
    }
    user.external_source = Some(CATALYST_SOURCE.to_string());
    user.last_sync_at = Some(now);
    user.updated_at = now;

    diesel::update(users::table.find(user.id))
        .set(&user)
        .execute(conn)
        .map_err(|e| format!("Goal update failed for '{}': {e}", item.employee_id))?;
    Ok(())
}

/// `POST /api/catalyst/goals`
pub async fn sync_goals(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GoalSyncRequest>,
) -> Result<Json<GoalSyncResult>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;
    let now = Utc::now();

    let mut updated = 0usize;
    let mut errors = Vec::new();
    for item in &request.goals {
        match apply_goal_item(&mut conn, item, now) {
            Ok(()) => updated += 1,
            Err(message) => errors.push(message),
        }
    }

    log::info!(
        "Catalyst goal sync: {updated}/{} users updated, {} errors",
        request.goals.len(),
        errors.len()
    );
    Ok(Json(GoalSyncResult {
        success: errors.is_empty(),
        updated,
        total: request.goals.len(),
        errors: if errors.is_empty() { None } else { Some(errors) },
    }))
}

pub fn configure_catalyst_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/catalyst/goals", post(sync_goals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_items_accept_camel_case_payloads() {
        let request: GoalSyncRequest = serde_json::from_str(
            r#"{"goals":[{"employeeId":"E100","daily":2,"yearly":480}]}"#,
        )
        .unwrap();
        assert_eq!(request.goals.len(), 1);
        assert_eq!(request.goals[0].employee_id, "E100");
        assert_eq!(request.goals[0].daily, Some(2));
        assert_eq!(request.goals[0].monthly, None);
    }
}

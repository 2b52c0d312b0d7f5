//! Time-and-motion observations recorded against a standard, with a per-UOM
//! quantity × SAM breakdown.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::models::{Observation, ObservationDataRow};
use crate::shared::schema::{observation_data, observations, standards, users};
use crate::shared::state::AppState;
use crate::shared::{api_error, db_unavailable, internal_error, ApiError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayEntry {
    pub reason: String,
    pub minutes: f64,
}

#[derive(Debug, Deserialize)]
pub struct ObservationDataInput {
    pub uom: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i32,
    pub sam_value: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateObservationRequest {
    pub user_id: Uuid,
    pub standard_id: Uuid,
    pub time_observed: f64,
    pub observed_performance: f64,
    pub pump_score: f64,
    pub pace: f64,
    pub utilization: f64,
    pub methods: f64,
    pub comments: Option<String>,
    #[serde(default)]
    pub best_practices_checked: Vec<String>,
    #[serde(default)]
    pub process_adherence_checked: Vec<String>,
    #[serde(default)]
    pub delays: Vec<DelayEntry>,
    pub observation_reason: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    #[serde(default)]
    pub data: Vec<ObservationDataInput>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationQuery {
    pub user_id: Option<Uuid>,
    pub standard_id: Option<Uuid>,
    pub finalized: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ObservationWithData {
    #[serde(flatten)]
    pub observation: Observation,
    pub data: Vec<ObservationDataRow>,
}

/// Total SAMs earned across the per-UOM breakdown.
pub fn total_sams(data: &[ObservationDataInput]) -> f64 {
    data.iter()
        .map(|row| f64::from(row.quantity) * row.sam_value)
        .sum()
}

pub async fn create_observation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateObservationRequest>,
) -> Result<Json<ObservationWithData>, ApiError> {
    if req.ended_at < req.started_at {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "ended_at must not precede started_at",
        ));
    }
    for row in &req.data {
        if row.quantity < 0 || !(row.sam_value.is_finite() && row.sam_value > 0.0) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Invalid quantity or samValue for UOM '{}'", row.uom),
            ));
        }
    }

    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let standard_exists: bool =
        diesel::select(diesel::dsl::exists(standards::table.find(req.standard_id)))
            .get_result(&mut conn)
            .map_err(|e| internal_error("Standard lookup failed", e))?;
    if !standard_exists {
        return Err(api_error(StatusCode::BAD_REQUEST, "Standard not found"));
    }
    let user_exists: bool = diesel::select(diesel::dsl::exists(users::table.find(req.user_id)))
        .get_result(&mut conn)
        .map_err(|e| internal_error("User lookup failed", e))?;
    if !user_exists {
        return Err(api_error(StatusCode::BAD_REQUEST, "User not found"));
    }

    let now = Utc::now();
    let observation = Observation {
        id: Uuid::new_v4(),
        user_id: req.user_id,
        standard_id: req.standard_id,
        time_observed: req.time_observed,
        total_sams: total_sams(&req.data),
        observed_performance: req.observed_performance,
        pump_score: req.pump_score,
        pace: req.pace,
        utilization: req.utilization,
        methods: req.methods,
        comments: req.comments,
        best_practices_checked: req.best_practices_checked,
        process_adherence_checked: req.process_adherence_checked,
        delays: serde_json::to_value(&req.delays)
            .unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
        observation_reason: req.observation_reason,
        started_at: req.started_at,
        ended_at: req.ended_at,
        is_finalized: false,
        created_at: now,
    };

    let data_rows = conn
        .transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::insert_into(observations::table)
                .values(&observation)
                .execute(conn)?;
            let mut inserted = Vec::with_capacity(req.data.len());
            for row in &req.data {
                let data_row = ObservationDataRow {
                    id: Uuid::new_v4(),
                    observation_id: observation.id,
                    uom: row.uom.clone(),
                    description: row.description.clone(),
                    quantity: row.quantity,
                    sam_value: row.sam_value,
                    total_sams: f64::from(row.quantity) * row.sam_value,
                    created_at: now,
                };
                diesel::insert_into(observation_data::table)
                    .values(&data_row)
                    .execute(conn)?;
                inserted.push(data_row);
            }
            Ok(inserted)
        })
        .map_err(|e| internal_error("Failed to create observation", e))?;

    log::info!(
        "Recorded observation {} against standard {}",
        observation.id,
        observation.standard_id
    );
    Ok(Json(ObservationWithData {
        observation,
        data: data_rows,
    }))
}

pub async fn list_observations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ObservationQuery>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let mut q = observations::table.into_boxed();
    if let Some(user_id) = query.user_id {
        q = q.filter(observations::user_id.eq(user_id));
    }
    if let Some(standard_id) = query.standard_id {
        q = q.filter(observations::standard_id.eq(standard_id));
    }
    if let Some(finalized) = query.finalized {
        q = q.filter(observations::is_finalized.eq(finalized));
    }
    if let Some(from) = query.from {
        q = q.filter(observations::started_at.ge(from));
    }
    if let Some(to) = query.to {
        q = q.filter(observations::started_at.le(to));
    }

    let rows: Vec<Observation> = q
        .order(observations::started_at.desc())
        .limit(query.limit.unwrap_or(100))
        .offset(query.offset.unwrap_or(0))
        .load(&mut conn)
        .map_err(|e| internal_error("Observation query failed", e))?;
    Ok(Json(rows))
}

pub async fn get_observation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ObservationWithData>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let observation: Observation = observations::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Observation query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Observation not found"))?;

    let data: Vec<ObservationDataRow> = observation_data::table
        .filter(observation_data::observation_id.eq(id))
        .order(observation_data::created_at.asc())
        .load(&mut conn)
        .map_err(|e| internal_error("Observation data query failed", e))?;

    Ok(Json(ObservationWithData { observation, data }))
}

pub async fn finalize_observation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Observation>, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let observation: Observation = observations::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Observation query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Observation not found"))?;

    if observation.is_finalized {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Observation is already finalized",
        ));
    }

    let updated: Observation = diesel::update(observations::table.find(id))
        .set(observations::is_finalized.eq(true))
        .get_result(&mut conn)
        .map_err(|e| internal_error("Observation finalize failed", e))?;

    log::info!("Finalized observation {id}");
    Ok(Json(updated))
}

/// Hard delete, allowed only while the observation is still a draft.
pub async fn delete_observation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.conn.get().map_err(db_unavailable)?;

    let observation: Observation = observations::table
        .find(id)
        .first(&mut conn)
        .optional()
        .map_err(|e| internal_error("Observation query failed", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Observation not found"))?;

    if observation.is_finalized {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Finalized observations cannot be deleted",
        ));
    }

    diesel::delete(observations::table.find(id))
        .execute(&mut conn)
        .map_err(|e| internal_error("Observation delete failed", e))?;

    log::info!("Deleted draft observation {id}");
    Ok(StatusCode::NO_CONTENT)
}

pub fn configure_observation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/observations",
            get(list_observations).post(create_observation),
        )
        .route(
            "/api/observations/:id",
            get(get_observation).delete(delete_observation),
        )
        .route("/api/observations/:id/finalize", post(finalize_observation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sams_sums_quantity_times_sam() {
        let data = vec![
            ObservationDataInput {
                uom: "Case".to_string(),
                description: String::new(),
                quantity: 10,
                sam_value: 0.45,
            },
            ObservationDataInput {
                uom: "Label".to_string(),
                description: String::new(),
                quantity: 20,
                sam_value: 0.05,
            },
        ];
        assert!((total_sams(&data) - 5.5).abs() < 1e-9);
        assert_eq!(total_sams(&[]), 0.0);
    }

    #[test]
    fn delay_entries_serialize_as_structured_records() {
        let delays = vec![DelayEntry {
            reason: "Waiting on forklift".to_string(),
            minutes: 4.5,
        }];
        let value = serde_json::to_value(&delays).unwrap();
        assert_eq!(value[0]["reason"], "Waiting on forklift");
        assert_eq!(value[0]["minutes"], 4.5);
    }
}

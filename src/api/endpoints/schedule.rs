//! Schedule endpoints.
//!
//! `GET /api/doctors/:id/schedule` — upcoming availability
//! `POST /api/schedule/availability` — doctor adds slots to a day

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{doctor, schedule};
use crate::models::enums::Role;
use crate::models::ScheduleDay;

#[derive(Deserialize)]
pub struct ScheduleQuery {
    /// First day to include, `YYYY-MM-DD`. Defaults to today.
    pub from: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    pub doctor_id: Uuid,
    pub days: Vec<ScheduleDay>,
}

/// `GET /api/doctors/:id/schedule`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let conn = ctx.open_db()?;
    if doctor::get_doctor(&conn, &doctor_id)?.is_none() {
        return Err(ApiError::NotFound("Doctor not found".into()));
    }

    let from = query.from.unwrap_or_else(|| Utc::now().date_naive());
    let days = schedule::get_schedule_from(&conn, &doctor_id, from)?;

    Ok(Json(ScheduleResponse { doctor_id, days }))
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub date: NaiveDate,
    pub slots: Vec<String>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub day: ScheduleDay,
}

/// `POST /api/schedule/availability` — the authenticated doctor adds
/// availability to their own schedule.
pub async fn add_availability(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    if caller.role != Role::Doctor {
        return Err(ApiError::Forbidden);
    }
    if req.slots.is_empty() {
        return Err(ApiError::BadRequest("At least one slot is required".into()));
    }
    for label in &req.slots {
        if label.trim().is_empty() {
            return Err(ApiError::BadRequest("Slot labels cannot be empty".into()));
        }
    }

    let conn = ctx.open_db()?;
    let profile = doctor::get_doctor_by_user(&conn, &caller.user_id)?
        .ok_or_else(|| ApiError::NotFound("Doctor profile not found".into()))?;

    let labels: Vec<String> = req.slots.iter().map(|s| s.trim().to_string()).collect();
    let day = schedule::add_availability(&conn, &profile.id, req.date, &labels)?;

    Ok(Json(AvailabilityResponse { day }))
}

//! Appointment endpoints.
//!
//! `POST /api/appointments/book` — patient books a slot
//! `GET /api/appointments/my` — caller's appointments
//! `PATCH /api/appointments/cancel/:id` — cancel (patient/doctor/admin)

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::booking::{self, Actor, BookingRequest, CancelOutcome};
use crate::db::repository::{appointment, doctor};
use crate::models::enums::Role;
use crate::models::Appointment;

#[derive(Deserialize)]
pub struct BookRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    /// Optional idempotency key; retries with the same key return the
    /// original booking.
    pub request_id: Option<String>,
}

#[derive(Serialize)]
pub struct BookResponse {
    pub appointment: Appointment,
}

/// `POST /api/appointments/book`
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    if caller.role != Role::Patient {
        return Err(ApiError::Forbidden);
    }
    if req.time.trim().is_empty() {
        return Err(ApiError::BadRequest("A time slot is required".into()));
    }

    let mut conn = ctx.open_db()?;
    let appointment = booking::book(
        &mut conn,
        &BookingRequest {
            patient_id: caller.user_id,
            doctor_id: req.doctor_id,
            date: req.date,
            time_label: req.time.trim().to_string(),
            request_id: req.request_id,
        },
    )?;

    Ok(Json(BookResponse { appointment }))
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

/// `GET /api/appointments/my` — a patient sees their bookings; a
/// doctor sees the bookings against their schedule.
pub async fn my(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let appointments = match caller.role {
        Role::Doctor => {
            let profile = doctor::get_doctor_by_user(&conn, &caller.user_id)?
                .ok_or_else(|| ApiError::NotFound("Doctor profile not found".into()))?;
            appointment::list_for_doctor(&conn, &profile.id)?
        }
        _ => appointment::list_for_patient(&conn, &caller.user_id)?,
    };

    Ok(Json(AppointmentsResponse { appointments }))
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub appointment: Appointment,
    /// False when the appointment was already cancelled (no-op).
    pub changed: bool,
}

/// `PATCH /api/appointments/cancel/:id`
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ApiError> {
    let mut conn = ctx.open_db()?;
    let outcome = booking::cancel(
        &mut conn,
        &appointment_id,
        &Actor {
            user_id: caller.user_id,
            role: caller.role,
        },
    )?;

    let changed = matches!(outcome, CancelOutcome::Cancelled(_));
    Ok(Json(CancelResponse {
        appointment: outcome.appointment().clone(),
        changed,
    }))
}

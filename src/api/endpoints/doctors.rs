//! Doctor directory endpoints.
//!
//! `GET /api/doctors` — browse the directory
//! `GET /api/doctors/:id` — one profile
//! `POST /api/doctors` — admin provisions a doctor (account + profile)
//! `PATCH /api/doctors/:id` — admin or the doctor themselves
//! `DELETE /api/doctors/:id` — admin

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::auth;
use crate::db::repository::doctor;
use crate::models::enums::Role;
use crate::models::{Doctor, DoctorListing};

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<DoctorListing>,
}

/// `GET /api/doctors`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<DoctorsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let doctors = doctor::list_doctors(&conn)?;
    Ok(Json(DoctorsResponse { doctors }))
}

#[derive(Serialize)]
pub struct DoctorResponse {
    pub doctor: Doctor,
}

/// `GET /api/doctors/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<DoctorResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let profile = doctor::get_doctor(&conn, &doctor_id)?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".into()))?;
    Ok(Json(DoctorResponse { doctor: profile }))
}

#[derive(Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub specialty: String,
    pub bio: Option<String>,
    #[serde(default)]
    pub consultation_fee: f64,
}

/// `POST /api/doctors` — creates the account (role `doctor`) and the
/// profile row together. Admin only.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Json(req): Json<CreateDoctorRequest>,
) -> Result<Json<DoctorResponse>, ApiError> {
    if caller.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }
    if req.specialty.trim().is_empty() {
        return Err(ApiError::BadRequest("Specialty is required".into()));
    }

    let conn = ctx.open_db()?;
    let account = auth::register(&conn, &req.name, &req.email, &req.password, Role::Doctor)?;

    let profile = Doctor {
        id: Uuid::new_v4(),
        user_id: account.id,
        specialty: req.specialty.trim().to_lowercase(),
        bio: req.bio,
        consultation_fee: req.consultation_fee,
    };
    doctor::insert_doctor(&conn, &profile)?;

    Ok(Json(DoctorResponse { doctor: profile }))
}

#[derive(Deserialize)]
pub struct UpdateDoctorRequest {
    pub specialty: Option<String>,
    pub bio: Option<String>,
    pub consultation_fee: Option<f64>,
}

/// `PATCH /api/doctors/:id` — admin, or the doctor updating their own
/// profile.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Path(doctor_id): Path<Uuid>,
    Json(req): Json<UpdateDoctorRequest>,
) -> Result<Json<DoctorResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let mut profile = doctor::get_doctor(&conn, &doctor_id)?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".into()))?;

    let is_self = caller.role == Role::Doctor && profile.user_id == caller.user_id;
    if caller.role != Role::Admin && !is_self {
        return Err(ApiError::Forbidden);
    }

    if let Some(specialty) = req.specialty {
        if specialty.trim().is_empty() {
            return Err(ApiError::BadRequest("Specialty cannot be empty".into()));
        }
        profile.specialty = specialty.trim().to_lowercase();
    }
    if let Some(bio) = req.bio {
        profile.bio = Some(bio);
    }
    if let Some(fee) = req.consultation_fee {
        profile.consultation_fee = fee;
    }

    doctor::update_doctor(&conn, &profile)?;
    Ok(Json(DoctorResponse { doctor: profile }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// `DELETE /api/doctors/:id` — admin only. Removes the profile from
/// the directory; the account and appointment history remain.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if caller.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }

    let conn = ctx.open_db()?;
    doctor::delete_doctor(&conn, &doctor_id).map_err(|e| {
        if e.is_constraint_violation() {
            ApiError::Conflict("Doctor has schedule or appointment history".into())
        } else {
            ApiError::from(e)
        }
    })?;
    Ok(Json(DeleteResponse { deleted: true }))
}

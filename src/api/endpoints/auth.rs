//! Account endpoints.
//!
//! `POST /api/auth/register` — create a patient account
//! `POST /api/auth/login` — issue a bearer token
//! `GET /api/auth/me` — the authenticated account
//! `POST /api/auth/logout` — invalidate the presented token

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::auth;
use crate::db::repository::user;
use crate::models::enums::Role;
use crate::models::PublicUser;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user: PublicUser,
}

/// `POST /api/auth/register` — always creates a patient. Doctor and
/// admin accounts are provisioned through the admin surface.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    validate_registration(&req)?;

    let conn = ctx.open_db()?;
    let account = auth::register(&conn, &req.name, &req.email, &req.password, Role::Patient)?;

    Ok(Json(RegisterResponse {
        user: account.public(),
    }))
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let (account, token) = auth::login(&conn, &req.email, &req.password)?;

    Ok(Json(LoginResponse {
        token,
        user: account.public(),
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

/// `GET /api/auth/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<MeResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let account = user::get_user(&conn, &caller.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(MeResponse {
        user: account.public(),
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// `POST /api/auth/logout` — invalidates the bearer token used.
pub async fn logout(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let conn = ctx.open_db()?;
    auth::logout(&conn, token)?;

    Ok(Json(LogoutResponse { logged_out: true }))
}

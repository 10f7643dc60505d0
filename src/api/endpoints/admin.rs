//! Admin endpoints.
//!
//! `GET /api/admin/stats` — dashboard aggregates
//! `GET /api/admin/patients/:id/summary` — AI patient summary
//! (admins and doctors)

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::{self, DashboardStats};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::llm::summary;
use crate::models::enums::Role;

#[derive(Serialize)]
pub struct StatsResponse {
    pub stats: DashboardStats,
}

/// `GET /api/admin/stats`
pub async fn stats(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<StatsResponse>, ApiError> {
    if caller.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }

    let conn = ctx.open_db()?;
    let stats = analytics::dashboard_stats(&conn)?;
    Ok(Json(StatsResponse { stats }))
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub patient_id: Uuid,
    pub summary: String,
}

/// `GET /api/admin/patients/:id/summary`
pub async fn patient_summary(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError> {
    if caller.role == Role::Patient {
        return Err(ApiError::Forbidden);
    }

    let llm = ctx.llm.clone();
    let ctx2 = ctx.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let conn = ctx2.open_db()?;
        summary::summarize_patient(&conn, llm.as_ref(), &patient_id)
            .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("summary task: {e}")))??;

    Ok(Json(SummaryResponse {
        patient_id,
        summary,
    }))
}

//! AI patient summaries for doctors and admins.

use rusqlite::Connection;
use uuid::Uuid;

use super::prompt;
use super::{LlmError, LlmGenerate};
use crate::db::repository::{appointment, user};
use crate::db::DatabaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Patient not found")]
    PatientNotFound,
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Generate a short natural-language summary of a patient's
/// appointment history.
pub fn summarize_patient(
    conn: &Connection,
    llm: &dyn LlmGenerate,
    patient_id: &Uuid,
) -> Result<String, SummaryError> {
    let patient = user::get_user(conn, patient_id)?.ok_or(SummaryError::PatientNotFound)?;
    let appointments = appointment::list_for_patient(conn, patient_id)?;

    let prompt = prompt::summary_prompt(&patient.name, &appointments);
    let summary = llm.generate(prompt::SUMMARY_SYSTEM, &prompt)?;
    Ok(summary.trim().to_string())
}

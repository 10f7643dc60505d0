use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

/// A booking linking a patient to one schedule slot of a doctor.
///
/// Never physically deleted; lifecycle is status transitions only.
/// While status is not `cancelled`, the referenced slot is flagged
/// booked in the doctor's schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_label: String,
    pub status: AppointmentStatus,
    /// Client-supplied idempotency key. A retry carrying the same key
    /// returns this appointment instead of booking a second slot.
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

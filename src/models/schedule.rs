use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One calendar day of a doctor's availability.
///
/// Slots are ordered by label; labels are unique within a day
/// (enforced by the `slots` UNIQUE(day_id, label) constraint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

/// A single bookable time label within a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub label: String,
    pub is_booked: bool,
}

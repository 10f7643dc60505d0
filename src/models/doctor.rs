use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Doctor profile. The account itself lives in `users` (role = doctor);
/// this row carries the practice-facing fields patients browse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialty: String,
    pub bio: Option<String>,
    pub consultation_fee: f64,
}

/// Doctor profile joined with the account name, for listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorListing {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub bio: Option<String>,
    pub consultation_fee: f64,
}

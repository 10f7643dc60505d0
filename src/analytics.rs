//! Admin dashboard aggregates. Pure SQL, no LLM involvement.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{appointment, user};
use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, Role};

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_appointments: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub completed: i64,
    pub patients: i64,
    pub doctors: i64,
    pub bookings_per_doctor: Vec<DoctorLoad>,
}

#[derive(Debug, Serialize)]
pub struct DoctorLoad {
    pub doctor_id: Uuid,
    pub live_appointments: i64,
}

pub fn dashboard_stats(conn: &Connection) -> Result<DashboardStats, DatabaseError> {
    let counts = appointment::count_by_status(conn)?;
    let get = |status: AppointmentStatus| {
        counts
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    };

    let bookings_per_doctor = appointment::count_live_per_doctor(conn)?
        .into_iter()
        .map(|(doctor_id, live_appointments)| DoctorLoad {
            doctor_id,
            live_appointments,
        })
        .collect();

    Ok(DashboardStats {
        total_appointments: counts.iter().map(|(_, c)| c).sum(),
        pending: get(AppointmentStatus::Pending),
        confirmed: get(AppointmentStatus::Confirmed),
        cancelled: get(AppointmentStatus::Cancelled),
        completed: get(AppointmentStatus::Completed),
        patients: user::count_users_with_role(conn, Role::Patient)?,
        doctors: user::count_users_with_role(conn, Role::Doctor)?,
        bookings_per_doctor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{self, BookingRequest};
    use crate::db::open_memory_database;
    use crate::db::repository::schedule;
    use crate::db::repository::test_fixtures::{seed_doctor, seed_patient};
    use crate::models::enums::Role;
    use chrono::NaiveDate;

    #[test]
    fn stats_reflect_three_confirmed_and_one_cancelled() {
        let mut conn = open_memory_database().unwrap();
        let patient = seed_patient(&conn, "pat@example.com");
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        let date = NaiveDate::parse_from_str("2025-01-10", "%Y-%m-%d").unwrap();
        schedule::add_availability(
            &conn,
            &doctor,
            date,
            &["09:00".into(), "09:30".into(), "10:00".into(), "10:30".into()],
        )
        .unwrap();

        let mut booked = Vec::new();
        for time in ["09:00", "09:30", "10:00", "10:30"] {
            booked.push(
                booking::book(
                    &mut conn,
                    &BookingRequest {
                        patient_id: patient,
                        doctor_id: doctor,
                        date,
                        time_label: time.into(),
                        request_id: None,
                    },
                )
                .unwrap(),
            );
        }
        booking::cancel(
            &mut conn,
            &booked[3].id,
            &booking::Actor { user_id: patient, role: Role::Patient },
        )
        .unwrap();

        let stats = dashboard_stats(&conn).unwrap();
        assert_eq!(stats.total_appointments, 4);
        assert_eq!(stats.confirmed, 3);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.patients, 1);
        assert_eq!(stats.doctors, 1);
        assert_eq!(stats.bookings_per_doctor.len(), 1);
        assert_eq!(stats.bookings_per_doctor[0].live_appointments, 3);
    }

    #[test]
    fn empty_database_yields_zeroes() {
        let conn = open_memory_database().unwrap();
        let stats = dashboard_stats(&conn).unwrap();
        assert_eq!(stats.total_appointments, 0);
        assert!(stats.bookings_per_doctor.is_empty());
    }
}

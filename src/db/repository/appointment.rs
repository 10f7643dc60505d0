use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;

const SELECT_COLS: &str =
    "id, patient_id, doctor_id, date, time_label, status, request_id, created_at";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, doctor_id, date, time_label, status, request_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.doctor_id.to_string(),
            appt.date.to_string(),
            appt.time_label,
            appt.status.as_str(),
            appt.request_id,
            appt.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {SELECT_COLS} FROM appointments WHERE id = ?1"),
            params![id.to_string()],
            appointment_row,
        )
        .optional()?;
    row.map(appointment_from_row).transpose()
}

/// Appointment previously created under this idempotency key, if any.
pub fn get_by_request_id(
    conn: &Connection,
    request_id: &str,
) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {SELECT_COLS} FROM appointments WHERE request_id = ?1"),
            params![request_id],
            appointment_row,
        )
        .optional()?;
    row.map(appointment_from_row).transpose()
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    list_where(conn, "patient_id = ?1", patient_id)
}

pub fn list_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    list_where(conn, "doctor_id = ?1", doctor_id)
}

fn list_where(
    conn: &Connection,
    clause: &str,
    id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLS} FROM appointments WHERE {clause} ORDER BY date, time_label"
    ))?;
    let rows = stmt.query_map(params![id.to_string()], appointment_row)?;

    let mut appts = Vec::new();
    for row in rows {
        appts.push(appointment_from_row(row?)?);
    }
    Ok(appts)
}

pub fn set_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE appointments SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Appointment counts grouped by status. Missing statuses count 0.
pub fn count_by_status(conn: &Connection) -> Result<Vec<(AppointmentStatus, i64)>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM appointments GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = Vec::new();
    for row in rows {
        let (status, count) = row?;
        counts.push((AppointmentStatus::from_str(&status)?, count));
    }
    Ok(counts)
}

/// Live (non-cancelled) bookings per doctor, for the admin dashboard.
pub fn count_live_per_doctor(conn: &Connection) -> Result<Vec<(Uuid, i64)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT doctor_id, COUNT(*) FROM appointments
         WHERE status != 'cancelled' GROUP BY doctor_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = Vec::new();
    for row in rows {
        let (doctor_id, count) = row?;
        counts.push((
            Uuid::parse_str(&doctor_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            count,
        ));
    }
    Ok(counts)
}

struct AppointmentRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    date: String,
    time_label: String,
    status: String,
    request_id: Option<String>,
    created_at: String,
}

fn appointment_row(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        time_label: row.get(4)?,
        status: row.get(5)?,
        request_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        doctor_id: Uuid::parse_str(&row.doctor_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        date: NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        time_label: row.time_label,
        status: AppointmentStatus::from_str(&row.status)?,
        request_id: row.request_id,
        created_at: DateTime::parse_from_rfc3339(&row.created_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_fixtures::{seed_doctor, seed_patient};

    fn sample_appointment(patient: Uuid, doctor: Uuid, time: &str) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id: patient,
            doctor_id: doctor,
            date: NaiveDate::parse_from_str("2025-01-10", "%Y-%m-%d").unwrap(),
            time_label: time.into(),
            status: AppointmentStatus::Confirmed,
            request_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_round_trip() {
        let conn = open_memory_database().unwrap();
        let patient = seed_patient(&conn, "pat@example.com");
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");

        let appt = sample_appointment(patient, doctor, "09:00");
        insert_appointment(&conn, &appt).unwrap();

        let fetched = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(fetched.time_label, "09:00");
        assert_eq!(fetched.status, AppointmentStatus::Confirmed);
        assert_eq!(fetched.date, appt.date);
    }

    #[test]
    fn request_id_lookup() {
        let conn = open_memory_database().unwrap();
        let patient = seed_patient(&conn, "pat@example.com");
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");

        let mut appt = sample_appointment(patient, doctor, "09:00");
        appt.request_id = Some("retry-key-1".into());
        insert_appointment(&conn, &appt).unwrap();

        let found = get_by_request_id(&conn, "retry-key-1").unwrap().unwrap();
        assert_eq!(found.id, appt.id);
        assert!(get_by_request_id(&conn, "other-key").unwrap().is_none());
    }

    #[test]
    fn set_status_on_missing_appointment_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = set_status(&conn, &Uuid::new_v4(), AppointmentStatus::Cancelled).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn status_counts_group_correctly() {
        let conn = open_memory_database().unwrap();
        let patient = seed_patient(&conn, "pat@example.com");
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");

        for time in ["09:00", "09:30", "10:00"] {
            insert_appointment(&conn, &sample_appointment(patient, doctor, time)).unwrap();
        }
        let mut cancelled = sample_appointment(patient, doctor, "10:30");
        cancelled.status = AppointmentStatus::Cancelled;
        insert_appointment(&conn, &cancelled).unwrap();

        let counts = count_by_status(&conn).unwrap();
        let get = |s: AppointmentStatus| {
            counts.iter().find(|(st, _)| *st == s).map(|(_, c)| *c).unwrap_or(0)
        };
        assert_eq!(get(AppointmentStatus::Confirmed), 3);
        assert_eq!(get(AppointmentStatus::Cancelled), 1);

        let per_doctor = count_live_per_doctor(&conn).unwrap();
        assert_eq!(per_doctor, vec![(doctor, 3)]);
    }
}

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Doctor, DoctorListing};

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (id, user_id, specialty, bio, consultation_fee)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doctor.id.to_string(),
            doctor.user_id.to_string(),
            doctor.specialty,
            doctor.bio,
            doctor.consultation_fee,
        ],
    )?;
    Ok(())
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, user_id, specialty, bio, consultation_fee
             FROM doctors WHERE id = ?1",
            params![id.to_string()],
            doctor_from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn get_doctor_by_user(conn: &Connection, user_id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, user_id, specialty, bio, consultation_fee
             FROM doctors WHERE user_id = ?1",
            params![user_id.to_string()],
            doctor_from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<DoctorListing>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT d.id, u.name, d.specialty, d.bio, d.consultation_fee
         FROM doctors d JOIN users u ON u.id = d.user_id
         ORDER BY u.name",
    )?;
    let rows = stmt.query_map([], listing_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Doctors matching a specialty (case-insensitive substring).
/// Used by the chatbot to turn a triage specialty into recommendations.
pub fn find_doctors_by_specialty(
    conn: &Connection,
    specialty: &str,
) -> Result<Vec<DoctorListing>, DatabaseError> {
    let pattern = format!("%{specialty}%");
    let mut stmt = conn.prepare(
        "SELECT d.id, u.name, d.specialty, d.bio, d.consultation_fee
         FROM doctors d JOIN users u ON u.id = d.user_id
         WHERE LOWER(d.specialty) LIKE LOWER(?1)
         ORDER BY u.name",
    )?;
    let rows = stmt.query_map(params![pattern], listing_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE doctors SET specialty = ?2, bio = ?3, consultation_fee = ?4
         WHERE id = ?1",
        params![
            doctor.id.to_string(),
            doctor.specialty,
            doctor.bio,
            doctor.consultation_fee,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "doctor".into(),
            id: doctor.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_doctor(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM doctors WHERE id = ?1", params![id.to_string()])?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn doctor_from_row(row: &rusqlite::Row<'_>) -> Result<Doctor, rusqlite::Error> {
    Ok(Doctor {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        specialty: row.get(2)?,
        bio: row.get(3)?,
        consultation_fee: row.get(4)?,
    })
}

fn listing_from_row(row: &rusqlite::Row<'_>) -> Result<DoctorListing, rusqlite::Error> {
    Ok(DoctorListing {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        name: row.get(1)?,
        specialty: row.get(2)?,
        bio: row.get(3)?,
        consultation_fee: row.get(4)?,
    })
}

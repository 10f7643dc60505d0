use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{ScheduleDay, TimeSlot};

/// Result of locating a slot by (doctor, date, label).
///
/// Distinguishes "doctor has no availability that day" from "the day
/// exists but no slot carries that label", per the locator contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotLookup {
    Found { slot_id: Uuid, is_booked: bool },
    DateNotFound,
    SlotNotFound,
}

/// Add availability for a doctor on one date. Creates the day on first
/// use; appends only labels not already present (labels unique per day).
/// Returns the stored day with all its slots.
pub fn add_availability(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
    labels: &[String],
) -> Result<ScheduleDay, DatabaseError> {
    let day_id: Option<String> = conn
        .query_row(
            "SELECT id FROM schedule_days WHERE doctor_id = ?1 AND date = ?2",
            params![doctor_id.to_string(), date.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    let day_id = match day_id {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO schedule_days (id, doctor_id, date) VALUES (?1, ?2, ?3)",
                params![id, doctor_id.to_string(), date.to_string()],
            )?;
            id
        }
    };

    for label in labels {
        conn.execute(
            "INSERT OR IGNORE INTO slots (id, day_id, label, is_booked)
             VALUES (?1, ?2, ?3, 0)",
            params![Uuid::new_v4().to_string(), day_id, label],
        )?;
    }

    get_day(conn, doctor_id, date)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "schedule_day".into(),
        id: format!("{doctor_id}/{date}"),
    })
}

/// One day of a doctor's schedule, slots ordered by label.
pub fn get_day(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
) -> Result<Option<ScheduleDay>, DatabaseError> {
    let day: Option<(String, String)> = conn
        .query_row(
            "SELECT id, date FROM schedule_days WHERE doctor_id = ?1 AND date = ?2",
            params![doctor_id.to_string(), date.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((day_id, date_str)) = day else {
        return Ok(None);
    };

    Ok(Some(ScheduleDay {
        id: Uuid::parse_str(&day_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        doctor_id: *doctor_id,
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or(date),
        slots: slots_for_day(conn, &day_id)?,
    }))
}

/// Full schedule for a doctor from a given date forward, day order.
pub fn get_schedule_from(
    conn: &Connection,
    doctor_id: &Uuid,
    from: NaiveDate,
) -> Result<Vec<ScheduleDay>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, date FROM schedule_days
         WHERE doctor_id = ?1 AND date >= ?2 ORDER BY date",
    )?;
    let days: Vec<(String, String)> = stmt
        .query_map(params![doctor_id.to_string(), from.to_string()], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<_, _>>()?;

    let mut schedule = Vec::with_capacity(days.len());
    for (day_id, date_str) in days {
        schedule.push(ScheduleDay {
            id: Uuid::parse_str(&day_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            doctor_id: *doctor_id,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            slots: slots_for_day(conn, &day_id)?,
        });
    }
    Ok(schedule)
}

/// Locate a slot without side effects.
pub fn locate_slot(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
    label: &str,
) -> Result<SlotLookup, DatabaseError> {
    let day_id: Option<String> = conn
        .query_row(
            "SELECT id FROM schedule_days WHERE doctor_id = ?1 AND date = ?2",
            params![doctor_id.to_string(), date.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    let Some(day_id) = day_id else {
        return Ok(SlotLookup::DateNotFound);
    };

    let slot: Option<(String, i64)> = conn
        .query_row(
            "SELECT id, is_booked FROM slots WHERE day_id = ?1 AND label = ?2",
            params![day_id, label],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match slot {
        Some((slot_id, is_booked)) => Ok(SlotLookup::Found {
            slot_id: Uuid::parse_str(&slot_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            is_booked: is_booked != 0,
        }),
        None => Ok(SlotLookup::SlotNotFound),
    }
}

/// Atomically flip a free slot to booked. Returns `true` if this call
/// won the slot, `false` if it was already booked (or gone). The WHERE
/// clause carries the precondition, so two racing bookings resolve to
/// exactly one winner inside SQLite's write serialization.
pub fn try_book_slot(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
    label: &str,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE slots SET is_booked = 1
         WHERE is_booked = 0
           AND label = ?3
           AND day_id = (SELECT id FROM schedule_days WHERE doctor_id = ?1 AND date = ?2)",
        params![doctor_id.to_string(), date.to_string(), label],
    )?;
    Ok(updated == 1)
}

/// Flip a booked slot back to free (cancellation path). Idempotent:
/// releasing an already-free slot is a no-op.
pub fn release_slot(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
    label: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE slots SET is_booked = 0
         WHERE label = ?3
           AND day_id = (SELECT id FROM schedule_days WHERE doctor_id = ?1 AND date = ?2)",
        params![doctor_id.to_string(), date.to_string(), label],
    )?;
    Ok(())
}

fn slots_for_day(conn: &Connection, day_id: &str) -> Result<Vec<TimeSlot>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, label, is_booked FROM slots WHERE day_id = ?1 ORDER BY label",
    )?;
    let rows = stmt.query_map(params![day_id], |row| {
        Ok(TimeSlot {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            label: row.get(1)?,
            is_booked: row.get::<_, i64>(2)? != 0,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_fixtures::seed_doctor;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn add_availability_creates_day_and_slots() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");

        let day = add_availability(
            &conn,
            &doctor,
            date("2025-01-10"),
            &["09:00".into(), "09:30".into()],
        )
        .unwrap();

        assert_eq!(day.slots.len(), 2);
        assert!(day.slots.iter().all(|s| !s.is_booked));
    }

    #[test]
    fn add_availability_is_additive_and_label_unique() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        let d = date("2025-01-10");

        add_availability(&conn, &doctor, d, &["09:00".into()]).unwrap();
        let day = add_availability(&conn, &doctor, d, &["09:00".into(), "10:00".into()]).unwrap();

        // Re-adding 09:00 did not duplicate it
        assert_eq!(day.slots.len(), 2);
    }

    #[test]
    fn locate_distinguishes_missing_date_from_missing_slot() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        add_availability(&conn, &doctor, date("2025-01-10"), &["09:00".into()]).unwrap();

        assert_eq!(
            locate_slot(&conn, &doctor, date("2025-01-11"), "09:00").unwrap(),
            SlotLookup::DateNotFound
        );
        assert_eq!(
            locate_slot(&conn, &doctor, date("2025-01-10"), "14:00").unwrap(),
            SlotLookup::SlotNotFound
        );
        assert!(matches!(
            locate_slot(&conn, &doctor, date("2025-01-10"), "09:00").unwrap(),
            SlotLookup::Found { is_booked: false, .. }
        ));
    }

    #[test]
    fn try_book_slot_wins_once() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        let d = date("2025-01-10");
        add_availability(&conn, &doctor, d, &["09:00".into(), "09:30".into()]).unwrap();

        assert!(try_book_slot(&conn, &doctor, d, "09:00").unwrap());
        // Second attempt on the same slot loses
        assert!(!try_book_slot(&conn, &doctor, d, "09:00").unwrap());
        // Neighboring slot unaffected
        let day = get_day(&conn, &doctor, d).unwrap().unwrap();
        let free: Vec<_> = day.slots.iter().filter(|s| !s.is_booked).collect();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].label, "09:30");
    }

    #[test]
    fn try_book_missing_slot_is_false() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        assert!(!try_book_slot(&conn, &doctor, date("2025-01-10"), "09:00").unwrap());
    }

    #[test]
    fn release_slot_frees_and_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        let d = date("2025-01-10");
        add_availability(&conn, &doctor, d, &["09:00".into()]).unwrap();
        try_book_slot(&conn, &doctor, d, "09:00").unwrap();

        release_slot(&conn, &doctor, d, "09:00").unwrap();
        release_slot(&conn, &doctor, d, "09:00").unwrap();

        assert!(try_book_slot(&conn, &doctor, d, "09:00").unwrap());
    }

    #[test]
    fn schedule_from_filters_past_days() {
        let conn = open_memory_database().unwrap();
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        add_availability(&conn, &doctor, date("2025-01-09"), &["09:00".into()]).unwrap();
        add_availability(&conn, &doctor, date("2025-01-10"), &["09:00".into()]).unwrap();

        let schedule = get_schedule_from(&conn, &doctor, date("2025-01-10")).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].date, date("2025-01-10"));
    }
}

//! Slot booking and cancellation.
//!
//! The booking transaction is the one place in the system with a real
//! invariant to protect: a slot is sold at most once. The slot flip is
//! a conditional UPDATE (`WHERE is_booked = 0`) and runs in the same
//! SQLite transaction as the appointment insert, so two racing requests
//! resolve to one winner and a failed insert leaves the slot free.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{appointment, doctor, schedule};
use crate::db::repository::schedule::SlotLookup;
use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, Role};
use crate::models::Appointment;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Doctor not found")]
    DoctorNotFound,
    #[error("No availability on the requested date")]
    DateNotFound,
    #[error("No such time slot on the requested date")]
    SlotNotFound,
    #[error("Slot is already booked")]
    SlotAlreadyBooked,
    #[error("Appointment not found")]
    AppointmentNotFound,
    #[error("Actor is not permitted to modify this appointment")]
    NotPermitted,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Parameters for one booking attempt.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_label: String,
    /// Client idempotency key. A retry with the same key returns the
    /// appointment created by the first attempt.
    pub request_id: Option<String>,
}

/// The authenticated party attempting a cancellation.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

/// Outcome of a cancellation. Both variants are success to the caller;
/// `AlreadyCancelled` marks the idempotent no-op path.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled(Appointment),
    AlreadyCancelled(Appointment),
}

impl CancelOutcome {
    pub fn appointment(&self) -> &Appointment {
        match self {
            Self::Cancelled(a) | Self::AlreadyCancelled(a) => a,
        }
    }
}

/// Book a slot: atomically flip it to booked and insert a confirmed
/// appointment, or fail with no observable side effects.
pub fn book(conn: &mut Connection, req: &BookingRequest) -> Result<Appointment, BookingError> {
    // Idempotent retry: same request_id returns the original booking.
    if let Some(request_id) = &req.request_id {
        if let Some(existing) = appointment::get_by_request_id(conn, request_id)? {
            tracing::debug!(%request_id, appointment = %existing.id, "Booking retry, returning existing");
            return Ok(existing);
        }
    }

    if doctor::get_doctor(conn, &req.doctor_id)?.is_none() {
        return Err(BookingError::DoctorNotFound);
    }

    let tx = conn.transaction().map_err(DatabaseError::from)?;

    // Check-and-set: wins the slot or tells us why not.
    if !schedule::try_book_slot(&tx, &req.doctor_id, req.date, &req.time_label)? {
        let reason = match schedule::locate_slot(&tx, &req.doctor_id, req.date, &req.time_label)? {
            SlotLookup::DateNotFound => BookingError::DateNotFound,
            SlotLookup::SlotNotFound => BookingError::SlotNotFound,
            SlotLookup::Found { .. } => BookingError::SlotAlreadyBooked,
        };
        return Err(reason); // tx drops, nothing applied
    }

    let appt = Appointment {
        id: Uuid::new_v4(),
        patient_id: req.patient_id,
        doctor_id: req.doctor_id,
        date: req.date,
        time_label: req.time_label.clone(),
        status: AppointmentStatus::Confirmed,
        request_id: req.request_id.clone(),
        created_at: Utc::now(),
    };

    // If the insert fails (e.g. the live-slot unique index), the
    // transaction rolls back and the slot flip is undone with it.
    appointment::insert_appointment(&tx, &appt)?;

    tx.commit().map_err(DatabaseError::from)?;
    tracing::info!(
        appointment = %appt.id,
        doctor = %req.doctor_id,
        date = %req.date,
        time = %req.time_label,
        "Appointment booked"
    );
    Ok(appt)
}

/// Cancel an appointment on behalf of `actor`.
///
/// Permitted actors: the owning patient, the appointment's doctor, or
/// an admin. The schedule slot is released in the same transaction so
/// it can be rebooked.
pub fn cancel(
    conn: &mut Connection,
    appointment_id: &Uuid,
    actor: &Actor,
) -> Result<CancelOutcome, BookingError> {
    let appt = appointment::get_appointment(conn, appointment_id)?
        .ok_or(BookingError::AppointmentNotFound)?;

    if !may_cancel(conn, &appt, actor)? {
        return Err(BookingError::NotPermitted);
    }

    if appt.status == AppointmentStatus::Cancelled {
        return Ok(CancelOutcome::AlreadyCancelled(appt));
    }

    let tx = conn.transaction().map_err(DatabaseError::from)?;
    appointment::set_status(&tx, &appt.id, AppointmentStatus::Cancelled)?;
    schedule::release_slot(&tx, &appt.doctor_id, appt.date, &appt.time_label)?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(appointment = %appt.id, "Appointment cancelled, slot released");

    let cancelled = Appointment {
        status: AppointmentStatus::Cancelled,
        ..appt
    };
    Ok(CancelOutcome::Cancelled(cancelled))
}

fn may_cancel(
    conn: &Connection,
    appt: &Appointment,
    actor: &Actor,
) -> Result<bool, BookingError> {
    match actor.role {
        Role::Admin => Ok(true),
        Role::Patient => Ok(appt.patient_id == actor.user_id),
        Role::Doctor => {
            let profile = doctor::get_doctor_by_user(conn, &actor.user_id)?;
            Ok(profile.map(|d| d.id == appt.doctor_id).unwrap_or(false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_fixtures::{seed_doctor, seed_patient};
    use crate::db::{open_database, open_memory_database};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(patient: Uuid, doctor: Uuid, time: &str) -> BookingRequest {
        BookingRequest {
            patient_id: patient,
            doctor_id: doctor,
            date: date("2025-01-10"),
            time_label: time.into(),
            request_id: None,
        }
    }

    fn setup() -> (Connection, Uuid, Uuid) {
        let conn = open_memory_database().unwrap();
        let patient = seed_patient(&conn, "pat@example.com");
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        schedule::add_availability(
            &conn,
            &doctor,
            date("2025-01-10"),
            &["09:00".into(), "09:30".into()],
        )
        .unwrap();
        (conn, patient, doctor)
    }

    #[test]
    fn booking_flags_slot_and_creates_confirmed_appointment() {
        let (mut conn, patient, doctor) = setup();

        let appt = book(&mut conn, &request(patient, doctor, "09:00")).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Confirmed);

        let day = schedule::get_day(&conn, &doctor, date("2025-01-10")).unwrap().unwrap();
        let slot = |l: &str| day.slots.iter().find(|s| s.label == l).unwrap();
        assert!(slot("09:00").is_booked);
        assert!(!slot("09:30").is_booked);
    }

    #[test]
    fn second_booking_of_same_slot_fails() {
        let (mut conn, patient, doctor) = setup();
        let other_patient = seed_patient(&conn, "other@example.com");

        book(&mut conn, &request(patient, doctor, "09:00")).unwrap();
        let err = book(&mut conn, &request(other_patient, doctor, "09:00")).unwrap_err();
        assert!(matches!(err, BookingError::SlotAlreadyBooked));

        // Exactly one appointment exists
        let appts = appointment::list_for_doctor(&conn, &doctor).unwrap();
        assert_eq!(appts.len(), 1);
    }

    #[test]
    fn missing_date_and_missing_slot_are_distinct_failures() {
        let (mut conn, patient, doctor) = setup();

        let mut bad_date = request(patient, doctor, "09:00");
        bad_date.date = date("2025-02-01");
        assert!(matches!(
            book(&mut conn, &bad_date).unwrap_err(),
            BookingError::DateNotFound
        ));

        assert!(matches!(
            book(&mut conn, &request(patient, doctor, "14:00")).unwrap_err(),
            BookingError::SlotNotFound
        ));

        // Failed bookings created nothing
        assert!(appointment::list_for_patient(&conn, &patient).unwrap().is_empty());
    }

    #[test]
    fn unknown_doctor_fails_before_touching_schedule() {
        let (mut conn, patient, _) = setup();
        let err = book(&mut conn, &request(patient, Uuid::new_v4(), "09:00")).unwrap_err();
        assert!(matches!(err, BookingError::DoctorNotFound));
    }

    #[test]
    fn retry_with_same_request_id_returns_original() {
        let (mut conn, patient, doctor) = setup();

        let mut req = request(patient, doctor, "09:00");
        req.request_id = Some("key-1".into());

        let first = book(&mut conn, &req).unwrap();
        let second = book(&mut conn, &req).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(appointment::list_for_patient(&conn, &patient).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_bookings_yield_one_winner() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("race.db");
        let conn = open_database(&db_path).unwrap();
        let patient_a = seed_patient(&conn, "a@example.com");
        let patient_b = seed_patient(&conn, "b@example.com");
        let doctor = seed_doctor(&conn, "Dr. Chen", "cardiology");
        schedule::add_availability(&conn, &doctor, date("2025-01-10"), &["09:00".into()]).unwrap();
        drop(conn);

        let barrier = std::sync::Arc::new(std::sync::Barrier::new(2));
        let handles: Vec<_> = [patient_a, patient_b]
            .into_iter()
            .map(|patient| {
                let path = db_path.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let mut conn = open_database(&path).unwrap();
                    barrier.wait();
                    book(&mut conn, &request(patient, doctor, "09:00"))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(BookingError::SlotAlreadyBooked)))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);
    }

    #[test]
    fn patient_cancels_own_appointment_and_slot_is_released() {
        let (mut conn, patient, doctor) = setup();
        let appt = book(&mut conn, &request(patient, doctor, "09:00")).unwrap();

        let actor = Actor { user_id: patient, role: Role::Patient };
        let outcome = cancel(&mut conn, &appt.id, &actor).unwrap();
        assert!(matches!(outcome, CancelOutcome::Cancelled(_)));
        assert_eq!(outcome.appointment().status, AppointmentStatus::Cancelled);

        // Slot is free again and rebookable by someone else
        let other = seed_patient(&conn, "other@example.com");
        assert!(book(&mut conn, &request(other, doctor, "09:00")).is_ok());
    }

    #[test]
    fn cancel_is_idempotent() {
        let (mut conn, patient, doctor) = setup();
        let appt = book(&mut conn, &request(patient, doctor, "09:00")).unwrap();
        let actor = Actor { user_id: patient, role: Role::Patient };

        cancel(&mut conn, &appt.id, &actor).unwrap();
        let again = cancel(&mut conn, &appt.id, &actor).unwrap();
        assert!(matches!(again, CancelOutcome::AlreadyCancelled(_)));
    }

    #[test]
    fn foreign_patient_cannot_cancel() {
        let (mut conn, patient, doctor) = setup();
        let appt = book(&mut conn, &request(patient, doctor, "09:00")).unwrap();

        let stranger = seed_patient(&conn, "stranger@example.com");
        let err = cancel(
            &mut conn,
            &appt.id,
            &Actor { user_id: stranger, role: Role::Patient },
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::NotPermitted));
    }

    #[test]
    fn admin_may_cancel_any_appointment() {
        let (mut conn, patient, doctor) = setup();
        let appt = book(&mut conn, &request(patient, doctor, "09:00")).unwrap();

        let admin = crate::db::repository::test_fixtures::seed_user(
            &conn,
            "Admin",
            "admin@example.com",
            Role::Admin,
        );
        let outcome = cancel(&mut conn, &appt.id, &Actor { user_id: admin, role: Role::Admin });
        assert!(outcome.is_ok());
    }

    #[test]
    fn cancel_unknown_appointment_is_not_found() {
        let (mut conn, patient, _) = setup();
        let err = cancel(
            &mut conn,
            &Uuid::new_v4(),
            &Actor { user_id: patient, role: Role::Patient },
        )
        .unwrap_err();
        assert!(matches!(err, BookingError::AppointmentNotFound));
    }
}

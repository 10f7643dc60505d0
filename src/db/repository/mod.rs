pub mod appointment;
pub mod conversation;
pub mod doctor;
pub mod schedule;
pub mod session;
pub mod user;

/// Shared seed helpers for repository and domain tests.
#[cfg(test)]
pub(crate) mod test_fixtures {
    use chrono::Utc;
    use rusqlite::Connection;
    use uuid::Uuid;

    use crate::models::enums::Role;
    use crate::models::{Doctor, User};

    /// Insert a patient account, returning its user id.
    pub fn seed_patient(conn: &Connection, email: &str) -> Uuid {
        seed_user(conn, "Test Patient", email, Role::Patient)
    }

    /// Insert a doctor account plus profile, returning the doctor id.
    pub fn seed_doctor(conn: &Connection, name: &str, specialty: &str) -> Uuid {
        let email = format!("{}@clinic.example", Uuid::new_v4());
        let user_id = seed_user(conn, name, &email, Role::Doctor);
        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id,
            specialty: specialty.into(),
            bio: None,
            consultation_fee: 50.0,
        };
        super::doctor::insert_doctor(conn, &doctor).unwrap();
        doctor.id
    }

    pub fn seed_user(conn: &Connection, name: &str, email: &str, role: Role) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: "unused".into(),
            role,
            created_at: Utc::now(),
        };
        super::user::insert_user(conn, &user).unwrap();
        user.id
    }
}

use std::path::Path;

use rusqlite::Connection;

use super::DatabaseError;

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open a connection without running migrations. Used per-request once
/// the schema has been applied at startup.
pub fn open_existing(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    // WAL lets concurrent request handlers read while one writes;
    // busy_timeout makes racing writers queue instead of erroring.
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_initial.sql")),
        (2, include_str!("../../resources/migrations/002_chat.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let conn = open_memory_database().unwrap();
        // users, doctors, schedule_days, slots, appointments, sessions,
        // conversations, messages + schema_version = 9
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, 9, "Expected 9 tables, got {count}");
    }

    #[test]
    fn schema_version_is_current() {
        let conn = open_memory_database().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn migration_idempotent() {
        let conn = open_memory_database().unwrap();
        // Run migrations again — should not error
        let result = run_migrations(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_memory_database().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn live_slot_index_rejects_duplicate_live_appointments() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, name, email, password_hash, role, created_at)
             VALUES ('u1', 'Pat', 'p@x.com', 'h', 'patient', datetime('now')),
                    ('u2', 'Doc', 'd@x.com', 'h', 'doctor', datetime('now'));
             INSERT INTO doctors (id, user_id, specialty) VALUES ('doc1', 'u2', 'cardiology');
             INSERT INTO appointments (id, patient_id, doctor_id, date, time_label, status, created_at)
             VALUES ('a1', 'u1', 'doc1', '2025-01-10', '09:00', 'confirmed', datetime('now'));",
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO appointments (id, patient_id, doctor_id, date, time_label, status, created_at)
             VALUES ('a2', 'u1', 'doc1', '2025-01-10', '09:00', 'pending', datetime('now'))",
            [],
        );
        assert!(dup.is_err());

        // A cancelled row on the same slot is allowed
        conn.execute(
            "INSERT INTO appointments (id, patient_id, doctor_id, date, time_label, status, created_at)
             VALUES ('a3', 'u1', 'doc1', '2025-01-10', '09:00', 'cancelled', datetime('now'))",
            [],
        )
        .unwrap();
    }
}

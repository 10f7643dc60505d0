use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;

/// Store a bearer session. Only the token's SHA-256 hex digest is kept.
pub fn insert_session(
    conn: &Connection,
    token_hash: &str,
    user_id: &Uuid,
    expires_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token_hash, user_id.to_string(), expires_at.to_rfc3339()],
    )?;
    Ok(())
}

/// Resolve a token hash to its user, rejecting expired sessions.
/// Expired rows are deleted on sight.
pub fn resolve_session(
    conn: &Connection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>, DatabaseError> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT user_id, expires_at FROM sessions WHERE token_hash = ?1",
            params![token_hash],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((user_id, expires_at)) = row else {
        return Ok(None);
    };

    let expires = DateTime::parse_from_rfc3339(&expires_at)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?
        .with_timezone(&Utc);

    if now >= expires {
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
        return Ok(None);
    }

    Ok(Some(Uuid::parse_str(&user_id).map_err(|e| {
        DatabaseError::ConstraintViolation(e.to_string())
    })?))
}

pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
    Ok(())
}

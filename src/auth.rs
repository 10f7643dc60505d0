//! Accounts and bearer sessions.
//!
//! Passwords are stored as PHC-format PBKDF2-HMAC-SHA256 strings.
//! Login issues an opaque bearer token; only its SHA-256 hex digest
//! reaches the `sessions` table, so a leaked database does not leak
//! usable tokens.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use pbkdf2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{session, user};
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::User;

/// Bearer sessions live for 24 hours.
const SESSION_TTL_HOURS: i64 = 24;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a bearer token, the only form persisted.
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Create an account. Fails with `EmailTaken` on duplicate email.
pub fn register(
    conn: &Connection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<User, AuthError> {
    let account = User {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        email: email.trim().to_lowercase(),
        password_hash: hash_password(password)?,
        role,
        created_at: Utc::now(),
    };

    user::insert_user(conn, &account).map_err(|e| {
        if e.is_constraint_violation() {
            AuthError::EmailTaken
        } else {
            AuthError::Database(e)
        }
    })?;

    tracing::info!(user = %account.id, role = account.role.as_str(), "Account registered");
    Ok(account)
}

/// Verify credentials and issue a bearer token.
pub fn login(conn: &Connection, email: &str, password: &str) -> Result<(User, String), AuthError> {
    let account = user::get_user_by_email(conn, email.trim())?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &account.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    let token = generate_token();
    session::insert_session(
        conn,
        &hash_token(&token),
        &account.id,
        Utc::now() + Duration::hours(SESSION_TTL_HOURS),
    )?;

    tracing::info!(user = %account.id, "Login");
    Ok((account, token))
}

/// Resolve a bearer token to its account, or `None` when the session
/// is unknown or expired.
pub fn authenticate(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<User>, AuthError> {
    let Some(user_id) = session::resolve_session(conn, &hash_token(token), now)? else {
        return Ok(None);
    };
    Ok(user::get_user(conn, &user_id)?)
}

/// Invalidate a bearer token.
pub fn logout(conn: &Connection, token: &str) -> Result<(), AuthError> {
    session::delete_session(conn, &hash_token(token))?;
    Ok(())
}

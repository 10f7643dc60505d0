//! Shared types for the API layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::Connection;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db;
use crate::db::DatabaseError;
use crate::llm::LlmGenerate;
use crate::models::enums::Role;

// ═══════════════════════════════════════════════════════════
// API context — shared state for all routes and middleware
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware. Constructed once
/// in `main` and cloned into the router; handlers open request-scoped
/// DB connections through it.
#[derive(Clone)]
pub struct ApiContext {
    db_path: Arc<PathBuf>,
    pub llm: Arc<dyn LlmGenerate>,
    /// Limits login/register attempts per source address.
    pub auth_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(config: &AppConfig, llm: Arc<dyn LlmGenerate>) -> Self {
        Self {
            db_path: Arc::new(config.db_path.clone()),
            llm,
            auth_limiter: Arc::new(Mutex::new(RateLimiter::new())),
        }
    }

    /// Open a request-scoped database connection. The schema was
    /// migrated at startup; this only sets pragmas.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_existing(&self.db_path)
    }
}

// ═══════════════════════════════════════════════════════════
// Auth context — injected by the auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, injected into request extensions after
/// successful bearer-token validation.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

// ═══════════════════════════════════════════════════════════
// Rate limiter — per-source sliding window
// ═══════════════════════════════════════════════════════════

/// Sliding-window rate limiter keyed by source identifier.
/// Applied to the unauthenticated auth endpoints.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
            per_minute: 30,
        }
    }

    #[cfg(test)]
    pub fn with_limit(per_minute: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
        }
    }

    /// Check if a source is within its limit. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, source: &str) -> Result<(), u64> {
        let now = Instant::now();
        let entries = self.windows.entry(source.to_string()).or_default();
        entries.retain(|ts| now.duration_since(*ts) < Duration::from_secs(60));

        if entries.len() as u32 >= self.per_minute {
            return Err(60);
        }

        entries.push(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_allows_under_limit() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check("1.2.3.4").is_ok());
        assert!(limiter.check("1.2.3.4").is_ok());
    }

    #[test]
    fn limiter_rejects_over_limit() {
        let mut limiter = RateLimiter::with_limit(2);
        assert!(limiter.check("1.2.3.4").is_ok());
        assert!(limiter.check("1.2.3.4").is_ok());
        assert_eq!(limiter.check("1.2.3.4"), Err(60));
    }

    #[test]
    fn limiter_isolates_sources() {
        let mut limiter = RateLimiter::with_limit(1);
        assert!(limiter.check("1.2.3.4").is_ok());
        assert!(limiter.check("5.6.7.8").is_ok());
        assert_eq!(limiter.check("1.2.3.4"), Err(60));
    }
}

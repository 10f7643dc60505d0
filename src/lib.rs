//! CuraBot — healthcare appointment booking backend.
//!
//! Patients register, describe symptoms to an LLM-backed chat that
//! triages them toward a specialty, browse doctor schedules, and book
//! time slots. Booking is race-free: a slot can only ever be held by
//! one live appointment, enforced both by a conditional update and a
//! partial unique index.

pub mod analytics;
pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod llm;
pub mod models;

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod chat;
pub mod doctors;
pub mod health;
pub mod schedule;

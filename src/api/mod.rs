//! HTTP API: router, middleware, endpoints, error mapping.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start, ApiServer};

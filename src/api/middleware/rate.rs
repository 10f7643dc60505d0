//! Rate limiting middleware for the unauthenticated auth endpoints.

use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Throttle by source address (brute-force protection on login/register).
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    let Some(ctx) = req.extensions().get::<ApiContext>().cloned() else {
        return ApiError::Internal("missing API context".into()).into_response();
    };

    // Under test (oneshot) there is no peer address; fall back to a
    // shared bucket rather than rejecting.
    let source = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let check = {
        let mut limiter = match ctx.auth_limiter.lock() {
            Ok(l) => l,
            Err(_) => return ApiError::Internal("limiter lock".into()).into_response(),
        };
        limiter.check(&source)
    };

    if let Err(retry_after) = check {
        return ApiError::RateLimited { retry_after }.into_response();
    }

    next.run(req).await
}

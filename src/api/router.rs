//! API router.
//!
//! Routes are nested under `/api/`. The unauthenticated surface is
//! `health`, `register`, and `login` (rate-limited); everything else
//! sits behind the bearer-token middleware.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer); endpoint handlers use `State<ApiContext>`.

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the full API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/doctors", get(endpoints::doctors::list))
        .route("/doctors", post(endpoints::doctors::create))
        .route("/doctors/:id", get(endpoints::doctors::detail))
        .route("/doctors/:id", patch(endpoints::doctors::update))
        .route("/doctors/:id", delete(endpoints::doctors::delete))
        .route("/doctors/:id/schedule", get(endpoints::schedule::get))
        .route(
            "/schedule/availability",
            post(endpoints::schedule::add_availability),
        )
        .route("/appointments/book", post(endpoints::appointments::book))
        .route("/appointments/my", get(endpoints::appointments::my))
        .route(
            "/appointments/cancel/:id",
            patch(endpoints::appointments::cancel),
        )
        .route("/chat", post(endpoints::chat::send))
        .route("/chat/conversations", get(endpoints::chat::conversations))
        .route(
            "/chat/conversations/:id",
            get(endpoints::chat::conversation_detail),
        )
        .route("/admin/stats", get(endpoints::admin::stats))
        .route(
            "/admin/patients/:id/summary",
            get(endpoints::admin::patient_summary),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes (rate-limited, no auth required)
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(CorsLayer::permissive())
}

//! Router configuration for the nextbox server.
//!
//! This module handles:
//! - API route definitions
//! - Preview proxy routes
//! - CORS and logging layers

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};

use crate::{handler, middleware as app_middleware, state::AppState};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Create a new router with the given state
pub fn create_router(state: AppState) -> Router {
    let cors = app_middleware::cors_layer(state.get_config().get_frontend_origin().clone());

    // Create REST API routes
    let rest_api = Router::new()
        .route("/create-sandbox", post(handler::create_sandbox))
        .route("/health", get(handler::health));

    // Create preview proxy routes
    let preview_routes = Router::new()
        .route("/preview/{sandbox_id}/{port}", any(handler::preview_request))
        .route(
            "/preview/{sandbox_id}/{port}/{*path}",
            any(handler::preview_request),
        );

    // The preflight guard must see requests before the CORS layer answers them
    Router::new()
        .merge(rest_api)
        .merge(preview_routes)
        .fallback(handler::not_found)
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::cors_preflight_guard,
        ))
        .layer(middleware::from_fn(app_middleware::logging_middleware))
        .with_state(state)
}

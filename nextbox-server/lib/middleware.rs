//! Middleware components for the nextbox server.
//!
//! This module handles:
//! - Cross-origin access restricted to the configured frontend origin
//! - Request and response logging

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{ACCESS_CONTROL_REQUEST_METHOD, ORIGIN},
        HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::state::AppState;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Build the CORS layer for the configured frontend origin.
///
/// The origin header is only sent back to that origin. Credentials are allowed, and any method or
/// header the browser asks for is mirrored back.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

//--------------------------------------------------------------------------------------------------
// Middleware Functions
//--------------------------------------------------------------------------------------------------

/// Reject CORS preflight requests coming from any origin other than the configured one
pub async fn cors_preflight_guard(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let is_preflight = req.method() == Method::OPTIONS
        && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);

    if is_preflight {
        if let Some(origin) = req.headers().get(ORIGIN) {
            if origin != state.get_config().get_frontend_origin() {
                tracing::warn!("Rejected CORS preflight from origin {:?}", origin);
                return (StatusCode::BAD_REQUEST, "Disallowed CORS origin").into_response();
            }
        }
    }

    next.run(req).await
}

/// Log incoming requests
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    // Log the request
    tracing::info!("Request: {} {}", method, uri);

    // Process the request
    let response = next.run(req).await;

    // Log the response
    tracing::info!("Response: {} {}: {}", method, uri, response.status());

    response
}

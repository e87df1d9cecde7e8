//! Request handlers for the nextbox server.
//!
//! This module implements:
//! - Sandbox creation
//! - Health check
//! - Preview proxying

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use nextbox_core::management::provision;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::ServerError,
    payload::{CreateSandboxResponse, HealthResponse, PreviewPath, HEALTHY_STATUS},
    proxy,
    state::AppState,
    ServerResult,
};

//--------------------------------------------------------------------------------------------------
// Functions: REST API Handlers
//--------------------------------------------------------------------------------------------------

/// Handler for health check
pub async fn health() -> ServerResult<impl IntoResponse> {
    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: HEALTHY_STATUS.to_string(),
        }),
    ))
}

/// Handler for creating a new sandbox
///
/// Every call provisions a brand-new sandbox; nothing about it is kept once the response is sent.
/// The sequence runs in its own task, so it completes even if the client disconnects.
pub async fn create_sandbox(State(state): State<AppState>) -> ServerResult<impl IntoResponse> {
    let span = tracing::info_span!("create_sandbox", request_id = %Uuid::new_v4());
    let provider = state.get_provider().clone();
    let plan = state.get_config().get_plan().clone();

    let sandbox = tokio::spawn(
        async move { provision(provider.as_ref(), &plan).await }.instrument(span),
    )
    .await
    .map_err(|e| ServerError::InternalError(format!("Provisioning task failed: {}", e)))?
    .map_err(ServerError::ProvisionError)?;

    Ok((StatusCode::OK, Json(CreateSandboxResponse::from(sandbox))))
}

//--------------------------------------------------------------------------------------------------
// Functions: Proxy Handlers
//--------------------------------------------------------------------------------------------------

/// Handler for requests to a sandbox preview
pub async fn preview_request(
    State(state): State<AppState>,
    Path(params): Path<PreviewPath>,
    req: Request<Body>,
) -> ServerResult<Response> {
    validate_sandbox_id(&params.sandbox_id)?;
    if params.port == 0 {
        return Err(ServerError::ValidationError(
            "Port must be between 1 and 65535".to_string(),
        ));
    }

    let preview = state
        .get_provider()
        .get_preview_link(&params.sandbox_id, params.port)
        .await
        .map_err(ServerError::PreviewError)?;

    let prefix = proxy::proxy_prefix(&params.sandbox_id, params.port);
    proxy::forward(state.get_http(), &preview, &prefix, &params.path, req).await
}

/// Fallback handler for unknown routes
pub async fn not_found() -> ServerResult<impl IntoResponse> {
    Ok((StatusCode::NOT_FOUND, "Resource not found"))
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Validates a sandbox identifier taken from a URL
fn validate_sandbox_id(id: &str) -> ServerResult<()> {
    if id.is_empty() {
        return Err(ServerError::ValidationError(
            "Sandbox id cannot be empty".to_string(),
        ));
    }

    if id.len() > 63 {
        return Err(ServerError::ValidationError(
            "Sandbox id cannot exceed 63 characters".to_string(),
        ));
    }

    let valid_chars = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_chars {
        return Err(ServerError::ValidationError(
            "Sandbox id can only contain alphanumeric characters, hyphens, or underscores"
                .to_string(),
        ));
    }

    if !id.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(ServerError::ValidationError(
            "Sandbox id must start with an alphanumeric character".to_string(),
        ));
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sandbox_id() {
        assert!(validate_sandbox_id("3f2a9c1e-7b4d-4e0a-9c55-0d1e2f3a4b5c").is_ok());
        assert!(validate_sandbox_id("sbx_1").is_ok());
        assert!(validate_sandbox_id("").is_err());
        assert!(validate_sandbox_id("-leading").is_err());
        assert!(validate_sandbox_id("../etc").is_err());
        assert!(validate_sandbox_id(&"a".repeat(64)).is_err());
    }
}

//! Error types for the nextbox server.
//!
//! Every error is turned into a JSON body of the form `{"detail": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nextbox_core::NextboxError;
use thiserror::Error;

use crate::payload::ErrorResponse;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a server operation.
pub type ServerResult<T> = Result<T, ServerError>;

/// An error returned by a server handler.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Provisioning a sandbox failed at some step.
    #[error("Failed to create sandbox: {0}")]
    ProvisionError(#[source] NextboxError),

    /// The preview link of a sandbox could not be resolved.
    #[error("Failed to resolve preview: {0}")]
    PreviewError(#[source] NextboxError),

    /// The request to the sandbox preview failed.
    #[error("Preview request failed: {0}")]
    ProxyError(String),

    /// The request was invalid.
    #[error("{0}")]
    ValidationError(String),

    /// The request body is larger than the proxy forwards.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The server configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An unexpected internal error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ServerError {
    /// The status code the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ProvisionError(_) | Self::ConfigError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // Provider 4xx answers (unknown sandbox, bad port) are the caller's fault
            Self::PreviewError(NextboxError::ProviderResponse { status, .. })
                if (400..500).contains(status) =>
            {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::PreviewError(_) | Self::ProxyError(_) => StatusCode::BAD_GATEWAY,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

//! Request and response payload definitions for the nextbox server.

use nextbox_core::management::ProvisionedSandbox;
use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The status reported by the health check.
pub const HEALTHY_STATUS: &str = "healthy";

//--------------------------------------------------------------------------------------------------
// Types: Requests
//--------------------------------------------------------------------------------------------------

/// Path parameters of a preview proxy request
#[derive(Debug, Deserialize)]
pub struct PreviewPath {
    /// The sandbox the preview belongs to
    pub sandbox_id: String,

    /// The port inside the sandbox
    pub port: u16,

    /// The path forwarded to the preview, without a leading slash
    #[serde(default)]
    pub path: String,
}

//--------------------------------------------------------------------------------------------------
// Types: Responses
//--------------------------------------------------------------------------------------------------

/// Response for a newly provisioned sandbox
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateSandboxResponse {
    /// Public URL of the running app
    pub frontend_url: String,

    /// Identifier of the sandbox
    pub sandbox_id: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `healthy`
    pub status: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description of the failure
    pub detail: String,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<ProvisionedSandbox> for CreateSandboxResponse {
    fn from(sandbox: ProvisionedSandbox) -> Self {
        Self {
            frontend_url: sandbox.frontend_url,
            sandbox_id: sandbox.sandbox_id,
        }
    }
}

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a nextbox-core operation.
pub type NextboxResult<T> = Result<T, NextboxError>;

/// An error that occurred while talking to the sandbox provider or provisioning a sandbox.
#[derive(Debug, Error)]
pub enum NextboxError {
    /// The HTTP request to the provider could not be completed.
    #[error("provider request failed: {0}")]
    ProviderRequest(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {message}")]
    ProviderResponse {
        /// The HTTP status code.
        status: u16,

        /// The response body, or the status reason when the body is empty.
        message: String,
    },

    /// A command run inside the sandbox exited with a non-zero code.
    #[error("command `{command}` exited with code {exit_code}: {output}")]
    CommandFailed {
        /// The command as submitted.
        command: String,

        /// The exit code reported by the provider.
        exit_code: i32,

        /// The combined command output.
        output: String,
    },

    /// The sandbox ended up in a failed state while starting.
    #[error("sandbox {id} failed to start (state `{state}`): {reason}")]
    SandboxStartFailed {
        /// The sandbox identifier.
        id: String,

        /// The last state reported by the provider.
        state: String,

        /// The reason reported by the provider, if any.
        reason: String,
    },

    /// An operation did not finish in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The provider answered with a body that could not be decoded.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// A JSON (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

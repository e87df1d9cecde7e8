//! The sandbox provider abstraction.
//!
//! This module defines:
//! - The [`SandboxProvider`] trait, the exact surface the provisioning sequence consumes
//! - Provider-neutral request and response types
//! - [`DaytonaProvider`], the implementation backed by the Daytona REST API

mod daytona;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{config::Resources, NextboxError, NextboxResult};

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use daytona::*;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Parameters for creating a sandbox from a base image.
#[derive(Debug, Clone)]
pub struct CreateSandboxParams {
    /// The base image.
    pub image: String,

    /// The requested resources.
    pub resources: Resources,

    /// Minutes of inactivity before auto-stop; zero disables it.
    pub auto_stop_interval: u32,

    /// How long to wait for the sandbox to reach the started state.
    pub start_timeout: Duration,
}

/// A sandbox as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
    /// The opaque sandbox identifier.
    pub id: String,

    /// The provider's lifecycle state, e.g. `started`.
    pub state: String,

    /// Whether previews are reachable without a token.
    pub public: bool,
}

/// A one-shot command run inside a sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    /// The shell command line.
    pub command: String,

    /// The working directory, or the sandbox default.
    pub cwd: Option<String>,

    /// The timeout enforced by the provider.
    pub timeout: Option<Duration>,
}

/// The outcome of a one-shot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteResponse {
    /// The exit code of the command.
    pub exit_code: i32,

    /// The combined output of the command.
    pub result: String,
}

/// A command run inside a named session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExecuteRequest {
    /// The shell command line.
    pub command: String,

    /// Whether to return immediately and leave the command running.
    pub run_async: bool,
}

/// The outcome of a session command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionExecuteResponse {
    /// The provider's identifier for the command.
    pub cmd_id: Option<String>,

    /// The output, only present for synchronous commands.
    pub output: Option<String>,

    /// The exit code, only present for synchronous commands.
    pub exit_code: Option<i32>,
}

/// An externally reachable URL for a port inside a sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLink {
    /// The preview URL.
    pub url: String,

    /// The access token required for private sandboxes.
    pub token: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// The operations a sandbox provider must offer to provision a sandbox.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Creates a sandbox and waits until it is started.
    async fn create_sandbox(&self, params: &CreateSandboxParams) -> NextboxResult<Sandbox>;

    /// Sets whether the sandbox previews are publicly reachable.
    async fn set_public(&self, sandbox_id: &str, public: bool) -> NextboxResult<()>;

    /// Runs a command to completion inside the sandbox.
    async fn execute_command(
        &self,
        sandbox_id: &str,
        request: &ExecuteRequest,
    ) -> NextboxResult<ExecuteResponse>;

    /// Writes a file inside the sandbox, replacing any existing content.
    async fn upload_file(&self, sandbox_id: &str, path: &str, content: Bytes) -> NextboxResult<()>;

    /// Reads a file from inside the sandbox.
    async fn download_file(&self, sandbox_id: &str, path: &str) -> NextboxResult<Bytes>;

    /// Creates a named, persistent shell session.
    async fn create_session(&self, sandbox_id: &str, session_id: &str) -> NextboxResult<()>;

    /// Runs a command inside a session.
    async fn execute_session_command(
        &self,
        sandbox_id: &str,
        session_id: &str,
        request: &SessionExecuteRequest,
    ) -> NextboxResult<SessionExecuteResponse>;

    /// Resolves the preview link for a port.
    async fn get_preview_link(&self, sandbox_id: &str, port: u16) -> NextboxResult<PreviewLink>;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ExecuteRequest {
    /// Creates a request for the given command line.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
            timeout: None,
        }
    }

    /// Sets the working directory.
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl ExecuteResponse {
    /// Turns a non-zero exit code into [`NextboxError::CommandFailed`].
    pub fn check(self, command: &str) -> NextboxResult<Self> {
        if self.exit_code == 0 {
            Ok(self)
        } else {
            Err(NextboxError::CommandFailed {
                command: command.to_string(),
                exit_code: self.exit_code,
                output: self.result.trim().to_string(),
            })
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

//! Application state management for the nextbox server.
//!
//! The state is immutable after startup: every request provisions its own sandbox, so nothing
//! is shared between requests apart from configuration and HTTP clients.

use std::sync::Arc;

use getset::Getters;
use nextbox_core::provider::SandboxProvider;
use reqwest::redirect::Policy;

use crate::{config::Config, ServerError, ServerResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Application state structure
#[derive(Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct AppState {
    /// The application configuration
    config: Arc<Config>,

    /// The provider sandboxes are created on
    provider: Arc<dyn SandboxProvider>,

    /// The client preview requests are forwarded with
    http: reqwest::Client,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl AppState {
    /// Create a new application state instance
    pub fn new(config: Arc<Config>, provider: Arc<dyn SandboxProvider>) -> ServerResult<Self> {
        // Redirects are handed back to the browser untouched
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|e| {
                ServerError::InternalError(format!("Failed to build preview client: {}", e))
            })?;

        Ok(Self {
            config,
            provider,
            http,
        })
    }
}

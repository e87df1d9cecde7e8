//! Configuration module for the nextbox server.
//!
//! This module handles server configuration including:
//! - The address the server listens on
//! - The single origin allowed to make cross-origin requests
//! - Sandbox provider credentials
//! - The provisioning plan every request runs

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;
use getset::Getters;
use nextbox_core::config::{ProviderConfig, ProvisionPlan};

use crate::{ServerError, ServerResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Configuration structure that holds all the application settings.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Config {
    /// The origin allowed to make cross-origin requests
    frontend_origin: HeaderValue,

    /// Address to listen on
    addr: SocketAddr,

    /// Credentials and endpoint of the sandbox provider
    provider: ProviderConfig,

    /// The provisioning plan run for every sandbox
    plan: ProvisionPlan,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl Config {
    /// Create a new configuration
    pub fn new(
        frontend_origin: &str,
        host: IpAddr,
        port: u16,
        provider: ProviderConfig,
        plan: ProvisionPlan,
    ) -> ServerResult<Self> {
        // Browsers send origins without a trailing slash
        let origin = frontend_origin.trim().trim_end_matches('/');
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(ServerError::ConfigError(format!(
                "Frontend origin must start with http:// or https://, got '{}'",
                frontend_origin
            )));
        }

        let frontend_origin = HeaderValue::from_str(origin).map_err(|e| {
            ServerError::ConfigError(format!("Invalid frontend origin '{}': {}", origin, e))
        })?;

        Ok(Self {
            frontend_origin,
            addr: SocketAddr::new(host, port),
            provider,
            plan,
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn provider() -> ProviderConfig {
        ProviderConfig::new("key", "https://app.daytona.io/api").unwrap()
    }

    #[test]
    fn test_config_normalizes_origin() {
        let config = Config::new(
            "http://localhost:3000/",
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            8000,
            provider(),
            ProvisionPlan::default(),
        )
        .unwrap();

        assert_eq!(config.get_frontend_origin(), "http://localhost:3000");
        assert_eq!(config.get_addr().to_string(), "127.0.0.1:8000");
    }

    #[test]
    fn test_config_rejects_origin_without_scheme() {
        let result = Config::new(
            "localhost:3000",
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            8000,
            provider(),
            ProvisionPlan::default(),
        );

        assert!(matches!(result, Err(ServerError::ConfigError(_))));
    }
}

use std::{net::IpAddr, time::Duration};

use clap::Parser;
use nextbox_core::config::{ProviderConfig, ProvisionPlan};
use nextbox_server::Config;
use nextbox_utils::{
    DAYTONA_API_KEY_ENV_VAR, DAYTONA_API_URL_ENV_VAR, DEFAULT_DAYTONA_API_URL,
    DEFAULT_FRONTEND_ORIGIN, DEFAULT_READINESS_TIMEOUT_SECS, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, FRONTEND_URL_ENV_VAR, NEXTBOX_HOST_ENV_VAR, NEXTBOX_PORT_ENV_VAR,
    NEXTBOX_READINESS_TIMEOUT_ENV_VAR,
};

use crate::{styles, NextboxCliError, NextboxCliResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Arguments for the nextbox-server command
///
/// Every argument can also be given through its environment variable or a `.env` file.
#[derive(Debug, Parser)]
#[command(name = "nextbox-server", author, version, about, styles=styles::styles())]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = NEXTBOX_HOST_ENV_VAR, default_value_t = DEFAULT_SERVER_HOST)]
    pub host: IpAddr,

    /// Port number to listen on
    #[arg(long, env = NEXTBOX_PORT_ENV_VAR, default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// The only origin allowed to make cross-origin requests
    #[arg(long = "frontend-origin", env = FRONTEND_URL_ENV_VAR, default_value = DEFAULT_FRONTEND_ORIGIN)]
    pub frontend_origin: String,

    /// Daytona API key
    #[arg(long = "api-key", env = DAYTONA_API_KEY_ENV_VAR, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Daytona API base URL
    #[arg(long = "api-url", env = DAYTONA_API_URL_ENV_VAR, default_value = DEFAULT_DAYTONA_API_URL)]
    pub api_url: String,

    /// Seconds to wait for the dev server of a new sandbox to accept connections
    #[arg(
        long = "readiness-timeout",
        env = NEXTBOX_READINESS_TIMEOUT_ENV_VAR,
        value_name = "SECS",
        default_value_t = DEFAULT_READINESS_TIMEOUT_SECS
    )]
    pub readiness_timeout: u64,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ServerArgs {
    /// Build the server configuration from the arguments
    pub fn into_config(self) -> NextboxCliResult<Config> {
        let api_key = self.api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            NextboxCliError::MissingSetting(format!(
                "Daytona API key (set {} or pass --api-key)",
                DAYTONA_API_KEY_ENV_VAR
            ))
        })?;

        let provider = ProviderConfig::new(api_key, &self.api_url)?;
        let plan = ProvisionPlan::builder()
            .readiness_timeout(Duration::from_secs(self.readiness_timeout))
            .build();

        Ok(Config::new(
            &self.frontend_origin,
            self.host,
            self.port,
            provider,
            plan,
        )?)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_args_definition_is_valid() {
        ServerArgs::command().debug_assert();
    }

    #[test]
    fn test_explicit_args_build_config() {
        let args = ServerArgs::try_parse_from([
            "nextbox-server",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--frontend-origin",
            "https://app.example.com",
            "--api-key",
            "dtn_test",
            "--api-url",
            "https://daytona.internal/api",
            "--readiness-timeout",
            "45",
        ])
        .unwrap();

        let config = args.into_config().unwrap();

        assert_eq!(config.get_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.get_frontend_origin(), "https://app.example.com");
        assert_eq!(
            config.get_provider().get_api_url().as_str(),
            "https://daytona.internal/api"
        );
        assert_eq!(
            config.get_plan().get_readiness_timeout(),
            Duration::from_secs(45)
        );
    }

    #[test]
    fn test_blank_api_key_is_reported() {
        let args = ServerArgs::try_parse_from(["nextbox-server", "--api-key", " "]).unwrap();

        let err = args.into_config().unwrap_err();

        assert!(matches!(err, NextboxCliError::MissingSetting(_)));
    }
}

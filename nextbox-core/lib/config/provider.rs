use getset::Getters;
use reqwest::Url;

use crate::{NextboxError, NextboxResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Credentials and endpoint for the sandbox provider.
#[derive(Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct ProviderConfig {
    /// The API key sent as a bearer token on every request.
    api_key: String,

    /// The base URL of the provider API.
    api_url: Url,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl ProviderConfig {
    /// Creates a new provider configuration.
    ///
    /// Fails if the API key is blank or the API URL is not an absolute http(s) URL.
    pub fn new(api_key: impl Into<String>, api_url: &str) -> NextboxResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(NextboxError::InvalidConfig(
                "provider API key must not be empty".to_string(),
            ));
        }

        let api_url = Url::parse(api_url.trim_end_matches('/')).map_err(|e| {
            NextboxError::InvalidConfig(format!("invalid provider API URL `{}`: {}", api_url, e))
        })?;

        if !matches!(api_url.scheme(), "http" | "https") || api_url.cannot_be_a_base() {
            return Err(NextboxError::InvalidConfig(format!(
                "provider API URL must be an http(s) URL, got `{}`",
                api_url
            )));
        }

        Ok(Self { api_key, api_url })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_rejects_blank_key() {
        let result = ProviderConfig::new("  ", "https://app.daytona.io/api");
        assert!(matches!(result, Err(NextboxError::InvalidConfig(_))));
    }

    #[test]
    fn test_provider_config_rejects_non_http_url() {
        assert!(ProviderConfig::new("key", "ftp://example.com").is_err());
        assert!(ProviderConfig::new("key", "not a url").is_err());
    }

    #[test]
    fn test_provider_config_trims_trailing_slash() {
        let config = ProviderConfig::new("key", "https://app.daytona.io/api/").unwrap();
        assert_eq!(config.get_api_url().as_str(), "https://app.daytona.io/api");
    }

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let config = ProviderConfig::new("super-secret", "https://app.daytona.io/api").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}

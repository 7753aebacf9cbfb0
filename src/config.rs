//! Client configuration.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::http::retry::{Backoff, DEFAULT_RETRY_TIMEOUT};
use crate::params::Params;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

pub const DEFAULT_QUERIES_PER_SECOND: usize = 50;

/// Per-request HTTP timeout: either one total timeout or a connect/read pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    Total(Duration),
    ConnectRead { connect: Duration, read: Duration },
}

/// Everything a [`Client`](crate::Client) is built from.
///
/// The client takes ownership at construction and never mutates it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key; must start with `AIza`.
    pub key: Option<String>,
    /// Enterprise client id.
    pub client_id: Option<String>,
    /// Enterprise shared secret, URL-safe base64.
    pub client_secret: Option<String>,
    /// Usage-reporting tag, only valid with a client id.
    pub channel: Option<String>,
    pub timeout: Option<Timeout>,
    /// Overall deadline for one logical request, measured from the first attempt.
    pub retry_timeout: Duration,
    pub queries_per_second: usize,
    pub retry_over_query_limit: bool,
    /// Extra headers sent with every request.
    pub headers: HeaderMap,
    /// Query parameters added to every request unless a call overrides them.
    pub default_params: Params,
    pub base_url: String,
    pub backoff: Backoff,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            key: None,
            client_id: None,
            client_secret: None,
            channel: None,
            timeout: None,
            retry_timeout: DEFAULT_RETRY_TIMEOUT,
            queries_per_second: DEFAULT_QUERIES_PER_SECOND,
            retry_over_query_limit: true,
            headers: HeaderMap::new(),
            default_params: Params::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            backoff: Backoff::default(),
        }
    }
}

impl ClientConfig {
    /// Config authenticating with an API key, defaults elsewhere.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Config authenticating with enterprise credentials, defaults elsewhere.
    pub fn with_enterprise(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Self::default()
        }
    }

    /// Checks the configuration and extracts validated credentials.
    pub fn validate(&self) -> Result<Credentials> {
        let credentials = Credentials::new(
            self.key.as_deref(),
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
            self.channel.as_deref(),
        )?;

        if self.queries_per_second == 0 {
            return Err(Error::config("queries_per_second must be positive"));
        }

        if self.base_url.is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }

        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.retry_timeout, Duration::from_secs(60));
        assert_eq!(config.queries_per_second, 50);
        assert!(config.retry_over_query_limit);
        assert_eq!(config.base_url, "https://maps.googleapis.com");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_default_config_has_no_credentials() {
        assert!(matches!(
            ClientConfig::default().validate(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_with_key_validates() {
        assert!(ClientConfig::with_key("AIzaasdf").validate().is_ok());
        assert!(ClientConfig::with_key("asdf").validate().is_err());
    }

    #[test]
    fn test_with_enterprise_validates() {
        let config = ClientConfig {
            channel: Some("my-channel".to_string()),
            ..ClientConfig::with_enterprise("foo", "a2V5")
        };
        let credentials = config.validate().unwrap();
        let enterprise = credentials.enterprise.unwrap();
        assert_eq!(enterprise.client_id, "foo");
        assert_eq!(enterprise.channel.as_deref(), Some("my-channel"));
    }

    #[test]
    fn test_zero_qps_rejected() {
        let config = ClientConfig {
            queries_per_second: 0,
            ..ClientConfig::with_key("AIzaasdf")
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}

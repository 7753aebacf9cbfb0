//! Credential handling: API keys and enterprise client id/secret pairs.

pub mod signer;

pub use signer::sign_hmac;

use crate::error::{Error, Result};

/// Prefix every valid API key starts with.
pub const API_KEY_PREFIX: &str = "AIza";

/// Enterprise credentials: client id, shared secret and optional channel tag.
#[derive(Clone, PartialEq, Eq)]
pub struct Enterprise {
    pub client_id: String,
    pub client_secret: String,
    pub channel: Option<String>,
}

impl std::fmt::Debug for Enterprise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enterprise")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("channel", &self.channel)
            .finish()
    }
}

/// The authentication material a client holds.
///
/// Both schemes may be present; which one a call uses depends on whether the
/// target endpoint accepts client id authentication.
#[derive(Clone, Default)]
pub struct Credentials {
    pub key: Option<String>,
    pub enterprise: Option<Enterprise>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("enterprise", &self.enterprise)
            .finish()
    }
}

/// Authentication chosen for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode<'a> {
    Key(&'a str),
    Enterprise(&'a Enterprise),
}

impl Credentials {
    /// Validates and assembles credentials from the raw configuration values.
    pub fn new(
        key: Option<&str>,
        client_id: Option<&str>,
        client_secret: Option<&str>,
        channel: Option<&str>,
    ) -> Result<Self> {
        let key = key.filter(|k| !k.is_empty());
        let client_id = client_id.filter(|c| !c.is_empty());
        let client_secret = client_secret.filter(|s| !s.is_empty());
        let channel = channel.filter(|c| !c.is_empty());

        if key.is_none() && (client_id.is_none() || client_secret.is_none()) {
            return Err(Error::config(
                "Must provide API key or enterprise credentials when creating client.",
            ));
        }

        if let Some(key) = key {
            validate_key(key)?;
        }

        if let Some(channel) = channel {
            if client_id.is_none() {
                return Err(Error::config(
                    "The channel argument must be used with a client ID",
                ));
            }
            validate_channel(channel)?;
        }

        let enterprise = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => {
                signer::decode_secret(client_secret)
                    .map_err(|e| Error::config(e.to_string()))?;
                Some(Enterprise {
                    client_id: client_id.to_string(),
                    client_secret: client_secret.to_string(),
                    channel: channel.map(str::to_string),
                })
            }
            _ => None,
        };

        Ok(Self {
            key: key.map(str::to_string),
            enterprise,
        })
    }

    /// Picks the scheme for a call. Enterprise credentials win when the
    /// endpoint accepts them; otherwise the API key is required.
    pub fn select(&self, accepts_client_id: bool) -> Result<AuthMode<'_>> {
        if accepts_client_id {
            if let Some(enterprise) = &self.enterprise {
                return Ok(AuthMode::Enterprise(enterprise));
            }
        }

        match &self.key {
            Some(key) => Ok(AuthMode::Key(key)),
            None => Err(Error::config(
                "Must provide API key for this API. It does not accept enterprise credentials.",
            )),
        }
    }
}

fn validate_key(key: &str) -> Result<()> {
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(Error::config("Invalid API key provided."));
    }
    Ok(())
}

/// Channels are restricted to ASCII alphanumerics, `.`, `_` and `-`.
fn validate_channel(channel: &str) -> Result<()> {
    let valid = channel
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(Error::config(
            "The channel argument must be an ASCII alphanumeric string. \
             The period (.), underscore (_) and hyphen (-) characters are allowed.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_some_credentials() {
        let result = Credentials::new(None, None, None, None);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_client_id_without_secret_is_not_enough() {
        let result = Credentials::new(None, Some("foo"), None, None);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_key_prefix_enforced() {
        let result = Credentials::new(Some("invalid-key"), None, None, None);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[test]
    fn test_valid_key() {
        let creds = Credentials::new(Some("AIzaasdf"), None, None, None).unwrap();
        assert_eq!(creds.select(true).unwrap(), AuthMode::Key("AIzaasdf"));
    }

    #[test]
    fn test_channel_requires_client_id() {
        let result = Credentials::new(Some("AIzaasdf"), None, None, Some("chan"));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_channel_charset() {
        let ok = Credentials::new(None, Some("foo"), Some("a2V5"), Some("My.Channel_1-x"));
        assert!(ok.is_ok());

        let bad = Credentials::new(None, Some("foo"), Some("a2V5"), Some("bad channel!"));
        assert!(matches!(bad, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_secret_must_be_base64() {
        let result = Credentials::new(None, Some("foo"), Some("%%%"), None);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_enterprise_preferred_when_accepted() {
        let creds = Credentials::new(Some("AIzaasdf"), Some("foo"), Some("a2V5"), None).unwrap();
        assert!(matches!(creds.select(true), Ok(AuthMode::Enterprise(_))));
        assert_eq!(creds.select(false).unwrap(), AuthMode::Key("AIzaasdf"));
    }

    #[test]
    fn test_enterprise_only_rejects_key_only_endpoint() {
        let creds = Credentials::new(None, Some("foo"), Some("a2V5"), None).unwrap();
        let err = creds.select(false).unwrap_err();
        assert!(err.to_string().contains("does not accept enterprise credentials"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new(Some("AIzaasdf"), Some("foo"), Some("a2V5"), None).unwrap();
        let out = format!("{:?}", creds);
        assert!(!out.contains("AIzaasdf"));
        assert!(!out.contains("a2V5"));
        assert!(out.contains("foo"));
    }
}

//! Error types returned by the request pipeline.

/// Terminal failures of a logical request.
///
/// Transient outcomes (over-quota responses, HTTP 500/503/504) are handled by the
/// retry loop and never surface here unless retrying is disabled.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad or missing credentials, invalid channel, or an endpoint that needs
    /// authentication this client cannot provide.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-ASCII input to the enterprise signing scheme.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Network-level failure other than a timeout.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The retry deadline passed or the HTTP client timed out.
    #[error("request timed out")]
    Timeout,

    /// Non-retriable HTTP status.
    #[error("HTTP Error: {0}")]
    Http(u16),

    /// The remote API reported a definitive failure status.
    #[error("{}", api_message(.status, .message))]
    Api {
        status: String,
        message: Option<String>,
    },

    /// Response body was not JSON or had no `status` field.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Maps a reqwest failure onto the taxonomy: timeouts are terminal
    /// `Timeout`, everything else is a `Transport` error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Transport(err)
        }
    }
}

fn api_message(status: &str, message: &Option<String>) -> String {
    match message {
        Some(msg) => format!("{} ({})", status, msg),
        None => status.to_string(),
    }
}

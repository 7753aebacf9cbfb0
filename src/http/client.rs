//! Request engine: one logical API call from URL building to parsed body.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tokio::time::sleep;

use crate::auth::Credentials;
use crate::config::{ClientConfig, Timeout};
use crate::error::{Error, Result};
use crate::params::Params;

use super::rate_limit::RateLimiter;
use super::retry::{Classified, OVER_QUERY_LIMIT, RETRIABLE_STATUSES, RequestAttempt, classify};
use super::url::build_auth_url;

/// User agent sent with every request.
pub const USER_AGENT_VALUE: &str = concat!("GoogleGeoApiClientRust/", env!("CARGO_PKG_VERSION"));

/// Custom response interpretation for endpoints whose bodies carry no
/// `status` field.
///
/// It sees every response except the retriable HTTP statuses, which are
/// retried before the body is looked at. Returning a retriable outcome makes
/// the engine retry as usual.
#[derive(Clone)]
pub struct BodyExtractor(Arc<dyn Fn(StatusCode, &[u8]) -> Result<Classified> + Send + Sync>);

impl BodyExtractor {
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(StatusCode, &[u8]) -> Result<Classified> + Send + Sync + 'static,
    {
        Self(Arc::new(extract))
    }

    pub fn extract(&self, status: StatusCode, body: &[u8]) -> Result<Classified> {
        (self.0)(status, body)
    }
}

impl std::fmt::Debug for BodyExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BodyExtractor(..)")
    }
}

/// One call to the remote API, as built by an endpoint wrapper.
#[derive(Debug, Clone)]
pub struct Request {
    pub path: String,
    pub params: Params,
    /// Whether the endpoint accepts enterprise (client id) authentication.
    pub accepts_client_id: bool,
    /// JSON body; when present the request is sent as a POST.
    pub post_json: Option<Value>,
    /// Per-call defaults, layered between the client defaults and `params`.
    pub extra_params: Params,
    /// Overrides the client's base URL for this call.
    pub base_url: Option<String>,
    /// Replaces the default response classification.
    pub extract_body: Option<BodyExtractor>,
    /// Headers for this call; a name set here replaces the client default.
    pub headers: HeaderMap,
    /// Total HTTP timeout for each attempt of this call.
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn get(path: impl Into<String>, params: Params) -> Self {
        Self {
            path: path.into(),
            params,
            accepts_client_id: true,
            post_json: None,
            extra_params: Params::new(),
            base_url: None,
            extract_body: None,
            headers: HeaderMap::new(),
            timeout: None,
        }
    }

    pub fn post(path: impl Into<String>, params: Params, body: Value) -> Self {
        Self {
            post_json: Some(body),
            ..Self::get(path, params)
        }
    }

    /// Marks the endpoint as accepting API keys only.
    pub fn key_only(mut self) -> Self {
        self.accepts_client_id = false;
        self
    }

    pub fn with_extra_params(mut self, extra_params: Params) -> Self {
        self.extra_params = extra_params;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_extractor(mut self, extract_body: BodyExtractor) -> Self {
        self.extract_body = Some(extract_body);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// API client owning its configuration, HTTP connection pool and rate limiter.
///
/// Clones share the same rate limiter.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    credentials: Arc<Credentials>,
    limiter: Arc<RateLimiter>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .field("credentials", &self.credentials)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Validates `config` and builds the client. No network activity happens here.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let credentials = config.validate()?;

        let mut headers = config.headers.clone();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(false);

        builder = match config.timeout {
            Some(Timeout::Total(timeout)) => builder.timeout(timeout),
            Some(Timeout::ConnectRead { connect, read }) => {
                builder.connect_timeout(connect).read_timeout(read)
            }
            None => builder,
        };

        let http = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            "Client configured for {} at {} requests/s",
            config.base_url, config.queries_per_second
        );

        Ok(Self {
            http,
            limiter: Arc::new(RateLimiter::new(config.queries_per_second)),
            credentials: Arc::new(credentials),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs one logical request, retrying transient failures until the
    /// configured deadline.
    ///
    /// Returns the parsed body on `OK` or `ZERO_RESULTS`. Transport failures,
    /// non-retriable HTTP statuses and API errors are returned immediately.
    #[tracing::instrument(skip(self, request), fields(path = %request.path))]
    pub async fn request(&self, request: Request) -> Result<Value> {
        let mut attempt = RequestAttempt::new(&request.path);
        let defaults = request.extra_params.over(&self.config.default_params);
        let base_url = request
            .base_url
            .as_deref()
            .unwrap_or(&self.config.base_url);

        loop {
            attempt.check_deadline(self.config.retry_timeout)?;

            if attempt.attempt() > 0 {
                let delay = attempt.delay(&self.config.backoff, self.config.retry_timeout);
                warn!(
                    "{}: retry {} in {}ms...",
                    attempt.path,
                    attempt.attempt(),
                    delay.as_millis()
                );
                sleep(delay).await;
            }

            let authed = build_auth_url(
                &request.path,
                &request.params,
                &defaults,
                &self.credentials,
                request.accepts_client_id,
            )?;

            let permit = self.limiter.acquire().await;

            debug!(
                "{} {}{} (attempt {})",
                if request.post_json.is_some() { "POST" } else { "GET" },
                base_url,
                attempt.path,
                attempt.attempt()
            );

            let url = format!("{}{}", base_url, authed.path);
            let mut builder = match &request.post_json {
                Some(body) => self.http.post(&url).json(body),
                None => self.http.get(&url),
            };
            if !request.headers.is_empty() {
                builder = builder.headers(request.headers.clone());
            }
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }

            let response = builder.send().await.map_err(Error::from_transport)?;
            let status = response.status();
            let body = response.bytes().await.map_err(Error::from_transport)?;

            let classified = match &request.extract_body {
                Some(extractor) if !RETRIABLE_STATUSES.contains(&status.as_u16()) => {
                    extractor.extract(status, &body)?
                }
                _ => classify(status, &body)?,
            };

            match classified {
                Classified::Success(body) | Classified::ZeroResults(body) => {
                    permit.record();
                    return Ok(body);
                }
                Classified::RetriableHttpStatus(code) => {
                    warn!("{}: server returned HTTP {}", attempt.path, code);
                }
                Classified::RetriableOverLimit { message } => {
                    if !self.config.retry_over_query_limit {
                        return Err(Error::Api {
                            status: OVER_QUERY_LIMIT.to_string(),
                            message,
                        });
                    }
                    warn!("{}: over query limit", attempt.path);
                }
                Classified::PermanentApiError { status, message } => {
                    debug!("{}: API error {}", attempt.path, status);
                    return Err(Error::Api { status, message });
                }
                Classified::PermanentHttpError(code) => {
                    debug!("{}: non-retriable HTTP {}", attempt.path, code);
                    return Err(Error::Http(code));
                }
            }

            attempt.next();
        }
    }
}

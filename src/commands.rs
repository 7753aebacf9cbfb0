//! Command implementations behind the `geoclient` binary.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::debug;
use serde_json::Value;

use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_QUERIES_PER_SECOND, Timeout};
use crate::geocoding::{GeocodeRequest, Geocoding, ReverseGeocodeRequest};
use crate::http::Client;

/// Connection and credential settings gathered from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub key: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub channel: Option<String>,
    pub base_url: Option<String>,
    pub queries_per_second: Option<usize>,
    pub retry_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub no_retry_over_query_limit: bool,
}

impl ClientOptions {
    pub fn to_config(&self) -> ClientConfig {
        ClientConfig {
            key: self.key.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            channel: self.channel.clone(),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            queries_per_second: self
                .queries_per_second
                .unwrap_or(DEFAULT_QUERIES_PER_SECOND),
            retry_timeout: self
                .retry_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(ClientConfig::default().retry_timeout),
            timeout: self
                .timeout_secs
                .map(|secs| Timeout::Total(Duration::from_secs(secs))),
            retry_over_query_limit: !self.no_retry_over_query_limit,
            ..ClientConfig::default()
        }
    }

    pub fn build(&self) -> Result<Client> {
        Client::new(self.to_config()).context("Failed to create API client")
    }
}

/// Parses a `name:value` or `name=value` component filter.
pub fn parse_component(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once([':', '=']) else {
        bail!("Invalid component '{}', expected NAME:VALUE", raw);
    };
    if name.is_empty() || value.is_empty() {
        bail!("Invalid component '{}', expected NAME:VALUE", raw);
    }
    Ok((name.to_string(), value.to_string()))
}

/// Runs a forward geocode and renders the results as pretty JSON.
pub async fn geocode<G: Geocoding + ?Sized>(geo: &G, request: GeocodeRequest) -> Result<String> {
    if request.address.is_none() && request.components.is_empty() {
        bail!("Either an address or at least one component is required");
    }
    debug!("Geocoding {:?}", request.address);
    let results = geo.geocode(request).await.context("Geocoding failed")?;
    render(&results)
}

/// Runs a reverse geocode and renders the results as pretty JSON.
pub async fn reverse_geocode<G: Geocoding + ?Sized>(
    geo: &G,
    request: ReverseGeocodeRequest,
) -> Result<String> {
    debug!("Reverse geocoding {}", request.latlng);
    let results = geo
        .reverse_geocode(request)
        .await
        .context("Reverse geocoding failed")?;
    render(&results)
}

fn render(results: &[Value]) -> Result<String> {
    serde_json::to_string_pretty(results).context("Failed to render results")
}

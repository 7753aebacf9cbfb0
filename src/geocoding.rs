//! Geocoding endpoints.
//!
//! Each wrapper only marshals its arguments into [`Params`] and calls
//! [`Client::request`] once.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::convert;
use crate::error::Result;
use crate::http::{Client, Request};
use crate::params::Params;

pub const GEOCODE_PATH: &str = "/maps/api/geocode/json";

/// Arguments for a forward geocode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeRequest {
    pub address: Option<String>,
    /// Component filter, e.g. `country` -> `US`.
    pub components: BTreeMap<String, String>,
    /// Viewport bias as `south,west|north,east`.
    pub bounds: Option<String>,
    pub region: Option<String>,
    pub language: Option<String>,
}

impl GeocodeRequest {
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(address) = &self.address {
            params.insert("address", address.as_str());
        }
        if !self.components.is_empty() {
            params.insert("components", convert::components(&self.components));
        }
        if let Some(bounds) = &self.bounds {
            params.insert("bounds", bounds.as_str());
        }
        if let Some(region) = &self.region {
            params.insert("region", region.as_str());
        }
        if let Some(language) = &self.language {
            params.insert("language", language.as_str());
        }
        params
    }
}

/// Arguments for a reverse geocode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseGeocodeRequest {
    /// `lat,lng`, or a place id (anything without a comma).
    pub latlng: String,
    pub result_type: Vec<String>,
    pub location_type: Vec<String>,
    pub language: Option<String>,
}

impl ReverseGeocodeRequest {
    pub fn new(latlng: impl Into<String>) -> Self {
        Self {
            latlng: latlng.into(),
            ..Self::default()
        }
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        if self.latlng.contains(',') {
            params.insert("latlng", self.latlng.as_str());
        } else {
            params.insert("place_id", self.latlng.as_str());
        }
        if !self.result_type.is_empty() {
            params.insert("result_type", convert::join_list("|", &self.result_type));
        }
        if !self.location_type.is_empty() {
            params.insert("location_type", convert::join_list("|", &self.location_type));
        }
        if let Some(language) = &self.language {
            params.insert("language", language.as_str());
        }
        params
    }
}

/// Geocoding operations offered by a client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoding: Send + Sync {
    /// Converts an address or component filter into geographic results.
    async fn geocode(&self, request: GeocodeRequest) -> Result<Vec<Value>>;

    /// Converts coordinates or a place id into address results.
    async fn reverse_geocode(&self, request: ReverseGeocodeRequest) -> Result<Vec<Value>>;
}

#[async_trait]
impl Geocoding for Client {
    #[tracing::instrument(skip(self))]
    async fn geocode(&self, request: GeocodeRequest) -> Result<Vec<Value>> {
        let body = self
            .request(Request::get(GEOCODE_PATH, request.to_params()))
            .await?;
        Ok(results(body))
    }

    #[tracing::instrument(skip(self))]
    async fn reverse_geocode(&self, request: ReverseGeocodeRequest) -> Result<Vec<Value>> {
        let body = self
            .request(Request::get(GEOCODE_PATH, request.to_params()))
            .await?;
        Ok(results(body))
    }
}

/// The `results` array of a response, empty when absent.
fn results(mut body: Value) -> Vec<Value> {
    match body.get_mut("results").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

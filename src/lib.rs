//! Client for a key-authenticated HTTP JSON geo API.
//!
//! Every endpoint goes through [`Client::request`], which signs or keys the
//! URL, honours the per-client rate limit, and retries transient failures with
//! jittered exponential backoff until the configured deadline.

pub mod auth;
pub mod commands;
pub mod config;
pub mod convert;
pub mod error;
pub mod geocoding;
pub mod http;
pub mod params;

pub use config::{ClientConfig, Timeout};
pub use error::{Error, Result};
pub use geocoding::{GeocodeRequest, Geocoding, ReverseGeocodeRequest};
pub use http::{BodyExtractor, Client, Request};
pub use params::{ParamValue, Params};

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! City/state → county geocoding for rally locations.
//!
//! Rallies are listed by city and state; the mortality data is by county.
//! A [`Geocoder`] turns a `"City, ST"` query into a [`GeocodedPlace`] whose
//! `county` field (e.g. `"Kenosha County"`) feeds the key normalizer.
//!
//! Providers are configured via TOML files in `services/`:
//!
//! 1. **Bing Maps Locations API** ([`bing`]): reads `adminDistrict2` from
//!    the first result. Needs an API key from the environment.
//! 2. **Lookup table** ([`lookup`]): an offline `City,State,County` CSV,
//!    useful for reruns and for environments without network access.
//!
//! All HTTP traffic goes through [`retry`], which adds a timeout-aware
//! bounded retry with exponential backoff.

pub mod bing;
pub mod lookup;
pub mod retry;
pub mod service_registry;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::service_registry::{GeocodingService, ProviderConfig};

/// A geocoding result.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    /// Second-level administrative district (county, parish, ...), if the
    /// provider returned one.
    pub county: Option<String>,
    /// The provider's formatted address for the match.
    pub formatted_address: Option<String>,
    /// The provider's full response for the match (`Null` when none).
    pub raw: serde_json::Value,
}

impl GeocodedPlace {
    /// A result with no match.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            county: None,
            formatted_address: None,
            raw: serde_json::Value::Null,
        }
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Status {
        /// Response status code.
        status: u16,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider needs an API key and the environment variable is unset.
    #[error("Environment variable {variable} is not set")]
    MissingApiKey {
        /// Name of the expected variable.
        variable: String,
    },

    /// Provider configuration is unusable.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// CSV parsing failed (lookup table).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (lookup table).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeocodeError {
    /// Whether retrying the same request could succeed.
    ///
    /// Timeouts, connection failures, rate limiting, and 5xx responses are
    /// transient. Bad keys, 4xx responses, unparseable bodies, and local
    /// configuration errors are permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => retry::is_transient(e),
            Self::Status { status } => *status >= 500,
            Self::RateLimited => true,
            Self::Parse { .. }
            | Self::MissingApiKey { .. }
            | Self::Config { .. }
            | Self::Csv(_)
            | Self::Io(_) => false,
        }
    }
}

/// A provider that resolves free-text place queries.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Identifier of the backing service (e.g. `"bing"`).
    fn id(&self) -> &str;

    /// Resolves `query` (e.g. `"Kenosha, WI"`).
    ///
    /// A query the provider cannot place is `Ok` with
    /// [`GeocodedPlace::county`] set to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails after retries or the
    /// response cannot be interpreted.
    async fn geocode(&self, query: &str) -> Result<GeocodedPlace, GeocodeError>;
}

/// Formats the query sent for a rally location: `"City, ST"`.
#[must_use]
pub fn location_query(city: &str, state: &str) -> String {
    format!("{}, {}", city.trim(), state.trim())
}

/// Builds the geocoder described by `service`.
///
/// `lookup_path` is the `City,State,County` table used by the lookup
/// provider and ignored by the others.
///
/// # Errors
///
/// Returns [`GeocodeError::MissingApiKey`] if Bing's key variable is unset,
/// [`GeocodeError::Config`] if the lookup provider has no table path, or
/// the underlying error if the client or table cannot be built.
pub fn from_service(
    service: &GeocodingService,
    lookup_path: Option<&Path>,
) -> Result<Box<dyn Geocoder>, GeocodeError> {
    match &service.provider {
        ProviderConfig::Bing {
            base_url,
            api_key_env,
        } => {
            let api_key =
                std::env::var(api_key_env).map_err(|_| GeocodeError::MissingApiKey {
                    variable: api_key_env.clone(),
                })?;
            let geocoder = bing::BingGeocoder::new(
                &service.id,
                base_url,
                &api_key,
                &service.request,
            )?;
            Ok(Box::new(geocoder))
        }
        ProviderConfig::Lookup => {
            let path = lookup_path.ok_or_else(|| GeocodeError::Config {
                message: format!("service '{}' needs a county lookup table", service.id),
            })?;
            Ok(Box::new(lookup::LookupGeocoder::from_path(path)?))
        }
    }
}

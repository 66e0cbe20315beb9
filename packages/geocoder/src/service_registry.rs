//! Compile-time registry of geocoding service configurations.
//!
//! Each geocoding provider is defined in a TOML file under `services/`.
//! The registry embeds these at compile time and exposes them via
//! [`all_services`], [`enabled_services`], and [`find_service`].

use std::time::Duration;

use serde::Deserialize;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"bing"`, `"lookup"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service can be selected.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Default order. The lowest enabled priority is used when no service
    /// is named explicitly.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
    /// Timeout, retry, and pacing settings.
    #[serde(default)]
    pub request: RequestConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Bing Maps Locations API.
    Bing {
        /// API endpoint (e.g., `"https://dev.virtualearth.net/REST/v1/Locations"`).
        base_url: String,
        /// Environment variable holding the API key.
        api_key_env: String,
    },
    /// Offline `City,State,County` table supplied at run time.
    Lookup,
}

/// Request pacing and robustness settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds; doubles each attempt.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Number of requests in flight at once.
    #[serde(default = "default_concurrent")]
    pub concurrent_requests: usize,
    /// Minimum delay between request starts in milliseconds.
    #[serde(default)]
    pub rate_limit_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            concurrent_requests: default_concurrent(),
            rate_limit_ms: 0,
        }
    }
}

impl RequestConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Minimum delay between request starts.
    #[must_use]
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_retries() -> u32 {
    4
}

const fn default_backoff_ms() -> u64 {
    2000
}

const fn default_concurrent() -> usize {
    1
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("bing", include_str!("../services/bing.toml")),
    ("lookup", include_str!("../services/lookup.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<GeocodingService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse geocoding service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<GeocodingService> {
    let mut services: Vec<GeocodingService> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

/// Returns the enabled service with the given id, or the highest-priority
/// enabled service when `id` is `None`.
#[must_use]
pub fn find_service(id: Option<&str>) -> Option<GeocodingService> {
    let mut services = enabled_services().into_iter();
    match id {
        Some(id) => services.find(|s| s.id == id),
        None => services.next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn bing_has_request_settings() {
        let bing = find_service(Some("bing")).unwrap();
        assert!(matches!(bing.provider, ProviderConfig::Bing { .. }));
        assert!(bing.request.max_retries > 0);
        assert!(bing.request.timeout_secs > 0);
        assert!(bing.request.concurrent_requests > 0);
    }

    #[test]
    fn lookup_uses_default_request_settings() {
        let lookup = find_service(Some("lookup")).unwrap();
        assert!(matches!(lookup.provider, ProviderConfig::Lookup));
        assert_eq!(lookup.request.concurrent_requests, 1);
        assert_eq!(lookup.request.rate_limit_ms, 0);
    }

    #[test]
    fn default_service_is_highest_priority() {
        let default = find_service(None).unwrap();
        assert_eq!(default.id, "bing");
        assert!(find_service(Some("nominatim")).is_none());
    }
}

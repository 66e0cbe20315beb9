//! Bing Maps Locations API client.
//!
//! Resolves free-form `"City, ST"` queries and reads the county from the
//! first result's `address.adminDistrict2` (e.g. `"Kenosha County"`).
//! Airport and rural queries sometimes come back without that field.
//!
//! See <https://learn.microsoft.com/en-us/bingmaps/rest-services/locations/find-a-location-by-query>

use async_trait::async_trait;

use crate::retry::{self, RetryPolicy};
use crate::service_registry::RequestConfig;
use crate::{GeocodeError, GeocodedPlace, Geocoder};

/// Bing geocoder bound to one API key.
pub struct BingGeocoder {
    id: String,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
}

impl BingGeocoder {
    /// Creates a client with the configured per-request timeout and retry
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(
        id: &str,
        base_url: &str,
        api_key: &str,
        request: &RequestConfig,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent("rally-impact/0.1")
            .timeout(request.timeout())
            .build()?;

        Ok(Self {
            id: id.to_string(),
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            policy: RetryPolicy::from_config(request),
        })
    }
}

#[async_trait]
impl Geocoder for BingGeocoder {
    fn id(&self) -> &str {
        &self.id
    }

    async fn geocode(&self, query: &str) -> Result<GeocodedPlace, GeocodeError> {
        let body = retry::send_json(
            || {
                self.client.get(&self.base_url).query(&[
                    ("q", query),
                    ("maxResults", "1"),
                    ("key", self.api_key.as_str()),
                ])
            },
            &self.policy,
        )
        .await?;

        parse_response(&body)
    }
}

/// Parses a Bing `Locations` response.
fn parse_response(body: &serde_json::Value) -> Result<GeocodedPlace, GeocodeError> {
    let resource_sets = body
        .get("resourceSets")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Bing response missing 'resourceSets' array".to_string(),
        })?;

    let Some(first) = resource_sets
        .first()
        .and_then(|set| set.get("resources"))
        .and_then(serde_json::Value::as_array)
        .and_then(|resources| resources.first())
    else {
        return Ok(GeocodedPlace::empty());
    };

    let address = first.get("address");
    let county = address
        .and_then(|a| a.get("adminDistrict2"))
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from);
    let formatted_address = address
        .and_then(|a| a.get("formattedAddress"))
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    Ok(GeocodedPlace {
        county,
        formatted_address,
        raw: first.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_county() {
        let body = serde_json::json!({
            "statusCode": 200,
            "resourceSets": [{
                "estimatedTotal": 1,
                "resources": [{
                    "name": "Kenosha, WI",
                    "address": {
                        "adminDistrict": "WI",
                        "adminDistrict2": "Kenosha County",
                        "countryRegion": "United States",
                        "formattedAddress": "Kenosha, WI",
                        "locality": "Kenosha"
                    },
                    "confidence": "High"
                }]
            }]
        });
        let place = parse_response(&body).unwrap();
        assert_eq!(place.county.as_deref(), Some("Kenosha County"));
        assert_eq!(place.formatted_address.as_deref(), Some("Kenosha, WI"));
        assert_eq!(place.raw["confidence"], "High");
    }

    #[test]
    fn missing_admin_district2_is_none() {
        let body = serde_json::json!({
            "resourceSets": [{
                "resources": [{
                    "address": {
                        "adminDistrict": "VA",
                        "formattedAddress": "Newport News, VA",
                        "locality": "Newport News"
                    }
                }]
            }]
        });
        let place = parse_response(&body).unwrap();
        assert!(place.county.is_none());
        assert!(!place.raw.is_null());
    }

    #[test]
    fn no_resources_is_empty() {
        let body = serde_json::json!({ "resourceSets": [{ "resources": [] }] });
        assert_eq!(parse_response(&body).unwrap(), GeocodedPlace::empty());

        let body = serde_json::json!({ "resourceSets": [] });
        assert_eq!(parse_response(&body).unwrap(), GeocodedPlace::empty());
    }

    #[test]
    fn rejects_unexpected_shape() {
        let body = serde_json::json!({ "errorDetails": ["Access was denied."] });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }
}

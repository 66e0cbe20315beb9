//! County resolution for rally locations.
//!
//! Each distinct `"City, ST"` is geocoded once, however many rallies were
//! held there. Requests go out through a buffered stream so up to
//! `concurrent_requests` are in flight, with at least `rate_limit` between
//! request starts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rally_impact_geocoder::service_registry::RequestConfig;
use rally_impact_geocoder::{Geocoder, location_query};
use rally_impact_rally_models::{LocatedRally, RallyRecord};
use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior};

use crate::progress::ProgressCallback;
use crate::{DEFAULT_FALLBACK_COUNTY, RallyError};

/// Pacing and fallback settings for [`resolve_counties`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// County used when the geocoder finds none.
    pub fallback_county: String,
    /// Requests in flight at once.
    pub concurrent_requests: usize,
    /// Minimum delay between request starts.
    pub rate_limit: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            fallback_county: DEFAULT_FALLBACK_COUNTY.to_string(),
            concurrent_requests: 1,
            rate_limit: Duration::ZERO,
        }
    }
}

impl ResolveOptions {
    /// Takes concurrency and pacing from a geocoding service's settings.
    #[must_use]
    pub fn from_request(request: &RequestConfig, fallback_county: &str) -> Self {
        Self {
            fallback_county: fallback_county.to_string(),
            concurrent_requests: request.concurrent_requests,
            rate_limit: request.rate_limit(),
        }
    }
}

fn request_pacer(rate_limit: Duration) -> Option<Mutex<Interval>> {
    if rate_limit.is_zero() {
        return None;
    }
    let mut interval = tokio::time::interval(rate_limit);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(Mutex::new(interval))
}

/// Geocodes every rally's location to a county.
///
/// Output order matches input order. A location the geocoder cannot place
/// gets `options.fallback_county` with `is_fallback` set.
///
/// # Errors
///
/// Returns [`RallyError::Geocode`] for the first lookup that still fails
/// after the client's retries. Requests not yet started are abandoned.
pub async fn resolve_counties(
    rallies: Vec<RallyRecord>,
    geocoder: &dyn Geocoder,
    options: &ResolveOptions,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Result<Vec<LocatedRally>, RallyError> {
    use futures::stream::{self, StreamExt as _, TryStreamExt as _};

    let mut seen = HashSet::new();
    let queries: Vec<String> = rallies
        .iter()
        .map(|rally| location_query(&rally.city, &rally.state))
        .filter(|query| seen.insert(query.clone()))
        .collect();

    let concurrent_requests = options.concurrent_requests.max(1);
    log::info!(
        "Geocoding {} locations for {} rallies via {} (concurrency={concurrent_requests})...",
        queries.len(),
        rallies.len(),
        geocoder.id()
    );
    if let Some(p) = progress {
        p.set_total(queries.len() as u64);
    }

    let pacer = request_pacer(options.rate_limit);
    let pacer = pacer.as_ref();

    let counties: HashMap<String, Option<String>> =
        stream::iter(queries.into_iter().map(|query| async move {
            if let Some(pacer) = pacer {
                pacer.lock().await.tick().await;
            }

            log::debug!("Geocoding '{query}'");
            let result = geocoder.geocode(&query).await;

            if let Some(p) = progress {
                p.inc(1);
            }

            match result {
                Ok(place) => Ok((query, place.county)),
                Err(source) => Err(RallyError::Geocode { query, source }),
            }
        }))
        .buffered(concurrent_requests)
        .try_collect()
        .await?;

    let mut fallbacks = 0_usize;
    let located: Vec<LocatedRally> = rallies
        .into_iter()
        .map(|rally| {
            let query = location_query(&rally.city, &rally.state);
            if let Some(county) = counties.get(&query).cloned().flatten() {
                log::info!("{query} -> {county}");
                return LocatedRally {
                    rally,
                    county,
                    is_fallback: false,
                };
            }

            log::warn!(
                "No county found for '{query}' ({}), using '{}'",
                rally.date,
                options.fallback_county
            );
            fallbacks += 1;
            LocatedRally {
                rally,
                county: options.fallback_county.clone(),
                is_fallback: true,
            }
        })
        .collect();

    if let Some(p) = progress {
        p.finish(format!("Geocoded {} rallies", located.len()));
    }
    log::info!(
        "Resolved counties for {} rallies ({fallbacks} without a county)",
        located.len()
    );

    Ok(located)
}

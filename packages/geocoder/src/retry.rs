//! HTTP retry helpers for transient errors.
//!
//! Geocoder clients call [`send_json`] instead of
//! `reqwest::RequestBuilder::send()` directly so every request gets bounded
//! retry with exponential backoff for transient failures (timeouts,
//! connection resets, server errors, rate limiting). The timeout itself is
//! set on the `reqwest::Client` by the caller. URLs are stripped from
//! errors and redacted in logs since they carry the API key.
//!
//! # Usage
//!
//! ```ignore
//! let policy = RetryPolicy::from_config(&service.request);
//! let body = retry::send_json(|| client.get(&url).query(&params), &policy).await?;
//! ```

use std::time::Duration;

use crate::GeocodeError;
use crate::service_registry::RequestConfig;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each later retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Builds the policy from a service's request settings.
    #[must_use]
    pub const fn from_config(config: &RequestConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (1-based): `base`, `2·base`,
    /// `4·base`, ...
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << shift)
    }
}

/// What to do with a response, by status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    /// 2xx/3xx: hand the response to the caller.
    Accept,
    /// 429 or 5xx: try again.
    Retry,
    /// Other 4xx: give up.
    Fail,
}

/// Classifies a response status.
#[must_use]
pub fn classify_status(status: reqwest::StatusCode) -> StatusAction {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StatusAction::Retry
    } else if status.is_client_error() {
        StatusAction::Fail
    } else {
        StatusAction::Accept
    }
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (since builders are consumed by
/// `.send()`).
///
/// A body that fails to arrive after an accepted status is retried like a
/// transient send error. Does **not** retry HTTP 4xx (except 429) or a body
/// that is not valid JSON, since those are permanent.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the request fails after all retries, the
/// server returns a non-retryable status code, or the response body cannot
/// be parsed as JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    build_request: F,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, GeocodeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let Accepted { url, status, text } = send_inner(&build_request, policy).await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview = text.chars().take(BODY_PREVIEW_LEN).collect::<String>();
        log::error!(
            "JSON parse failed.\n  \
             url: {}\n  \
             status: {status}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {preview}",
            redact_key(url),
            text.len(),
        );
        GeocodeError::Parse {
            message: format!("JSON parse failed: {e} (status={status})"),
        }
    })
}

/// A response whose status was accepted and whose body was read in full.
struct Accepted {
    url: reqwest::Url,
    status: reqwest::StatusCode,
    text: String,
}

/// Core retry loop. Returns the first accepted response with its body.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    policy: &RetryPolicy,
) -> Result<Accepted, GeocodeError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        let error = match build_request().send().await {
            Err(e) if is_transient(&e) => {
                let e = e.without_url();
                log::warn!("  transient error: {e}");
                GeocodeError::Http(e)
            }
            Err(e) => return Err(GeocodeError::Http(e.without_url())),
            Ok(response) => {
                let status = response.status();
                match classify_status(status) {
                    StatusAction::Accept => {
                        let url = response.url().clone();
                        match response.text().await {
                            Ok(text) => return Ok(Accepted { url, status, text }),
                            Err(e) => {
                                let e = e.without_url();
                                log::warn!("  body read failed: {e}");
                                GeocodeError::Http(e)
                            }
                        }
                    }
                    StatusAction::Fail => {
                        return Err(GeocodeError::Status {
                            status: status.as_u16(),
                        });
                    }
                    StatusAction::Retry if status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                        log::warn!("  HTTP 429 (rate limited)");
                        GeocodeError::RateLimited
                    }
                    StatusAction::Retry => {
                        log::warn!("  HTTP {status} (server error)");
                        GeocodeError::Status {
                            status: status.as_u16(),
                        }
                    }
                }
            }
        };

        if attempt >= max_retries {
            log::error!("Request failed after {max_retries} retries: {error}");
            return Err(error);
        }
        attempt += 1;
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
pub(crate) fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

/// Hides the `key` query parameter so API keys never reach the logs.
fn redact_key(mut url: reqwest::Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if !pairs.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}

//! Retry logic with exponential backoff for ledger HTTP calls.
//!
//! Retries transport errors (connection failures, timeouts) and HTTP 5xx
//! responses. Client errors (4xx) are returned immediately: resubmitting a
//! rejected transaction cannot change the ledger's answer.

use std::time::Duration;

/// Maximum number of retry attempts after the initial request.
pub(crate) const MAX_RETRIES: u32 = 3;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Send an HTTP request with exponential backoff retry.
///
/// The closure `f` is called up to `MAX_RETRIES + 1` times. The last
/// attempt's result is returned as-is, so a persistent 5xx reaches the
/// caller as a response to be mapped.
pub(crate) async fn retry_send<F, Fut>(
    endpoint: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..MAX_RETRIES {
        let failure = match f().await {
            Ok(resp) if resp.status().is_server_error() => format!("HTTP {}", resp.status()),
            Ok(resp) => return Ok(resp),
            Err(e) => e.to_string(),
        };
        let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
        tracing::warn!(
            endpoint,
            attempt = attempt + 1,
            max_retries = MAX_RETRIES,
            "ledger request failed, retrying in {delay:?}: {failure}"
        );
        tokio::time::sleep(delay).await;
    }
    f().await
}

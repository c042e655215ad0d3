//! Authenticated upstream GET with retry and backoff.
//!
//! Listing and detail calls against the DAM go through [`get_with_retry`];
//! stream probes do not, a failed probe simply excludes the asset.

use reqwest::{Client, Response};
use std::time::Duration;
use tracing::warn;

/// Default number of fetch attempts (1 initial + 1 retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default backoff between attempts in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 500;

/// Configuration for [`get_with_retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts (minimum 1; 0 is treated as 1).
    pub max_attempts: u32,
    /// Sleep duration between consecutive attempts.
    pub backoff: Duration,
    /// Per-attempt timeout. When `None`, the client's own timeout applies.
    pub timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
            timeout: None,
        }
    }
}

/// Outcome of an exhausted retry loop.
#[derive(Debug)]
pub enum FetchFailure {
    /// Upstream answered, but never with a 2xx.
    Status(reqwest::StatusCode),
    /// The request never produced a response.
    Transport(reqwest::Error),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Status(status) => write!(f, "HTTP {}", status),
            FetchFailure::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

/// GET `url` with an optional bearer token, retrying on any failure.
///
/// Returns the first 2xx [`Response`], or the last failure once
/// `config.max_attempts` attempts are exhausted.
pub async fn get_with_retry(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
    config: &RetryConfig,
) -> Result<Response, FetchFailure> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let mut request = client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = config.timeout {
            request = request.timeout(timeout);
        }

        let failure = match request.send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                warn!(
                    "Upstream returned {} for {} (attempt {}/{})",
                    response.status(),
                    url,
                    attempt,
                    max_attempts
                );
                FetchFailure::Status(response.status())
            }
            Err(e) => {
                warn!(
                    "Upstream request failed for {} (attempt {}/{}): {}",
                    url, attempt, max_attempts, e
                );
                FetchFailure::Transport(e)
            }
        };

        if attempt >= max_attempts {
            return Err(failure);
        }

        attempt += 1;
        tokio::time::sleep(config.backoff).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            backoff: Duration::from_millis(1),
            timeout: None,
        }
    }

    #[test]
    fn retry_config_defaults() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(cfg.backoff, Duration::from_millis(DEFAULT_BACKOFF_MS));
        assert!(cfg.timeout.is_none());
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let result = get_with_retry(&Client::new(), &server.uri(), Some("secret"), &fast(1)).await;
        assert_eq!(result.unwrap().text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn retries_on_server_error_then_succeeds() {
        let server = MockServer::start().await;

        // 200 fallback (lower priority, mounted first)
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        // 500 on first hit (higher priority, mounted last, deactivates after 1)
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let result = get_with_retry(&Client::new(), &server.uri(), None, &fast(2)).await;
        assert_eq!(result.unwrap().text().await.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn reports_last_status_after_all_retries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let result = get_with_retry(&Client::new(), &server.uri(), None, &fast(3)).await;
        match result {
            Err(FetchFailure::Status(status)) => assert_eq!(status.as_u16(), 503),
            other => panic!("expected status failure, got {:?}", other.map(|r| r.status())),
        }
    }

    #[tokio::test]
    async fn zero_attempts_still_sends_once() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let result = get_with_retry(&Client::new(), &server.uri(), None, &fast(0)).await;
        assert!(result.is_err());
    }
}

//! Resilient HTTP fetch primitive shared by every network-facing component.
//!
//! All outbound calls in the pipeline go through [`FetchClient`]: connectors,
//! the scoring client, and the generation client. It applies a fixed per-call
//! timeout and a bounded exponential-backoff retry, so no unbounded wait
//! exists anywhere else in the system.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use jobscout_shared::{JobscoutError, Result};

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("jobscout/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Bounded exponential-backoff policy. Wait grows as `base * 2^attempt`,
/// hard-capped at `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first try.
    pub max_attempts: u32,
    /// Wait before the second attempt.
    pub base_delay: Duration,
    /// Ceiling on any single wait.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Custom policy; exposed mainly for tests with millisecond delays.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Policy for plain listing fetches: 3 attempts, 2s base, 20s cap.
    pub fn fetch() -> Self {
        Self::new(3, Duration::from_secs(2), Duration::from_secs(20))
    }

    /// Policy for the scoring/generation endpoint family, which rate-limits
    /// more aggressively: 4 attempts, 4s base, 60s cap.
    pub fn scoring() -> Self {
        Self::new(4, Duration::from_secs(4), Duration::from_secs(60))
    }

    /// Backoff before retrying after the given zero-based attempt.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        exp.min(self.max_delay)
    }
}

// ---------------------------------------------------------------------------
// FetchClient
// ---------------------------------------------------------------------------

/// Shared HTTP client with timeout + retry. Holds no mutable state, so it is
/// safe to use concurrently from every connector without coordination.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    policy: RetryPolicy,
}

impl FetchClient {
    /// Build a client with the given retry policy and per-call timeout.
    pub fn new(policy: RetryPolicy, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| JobscoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, policy })
    }

    /// GET a page and return its body as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .execute_with_retry(url, || self.client.get(url))
            .await?;

        response
            .text()
            .await
            .map_err(|e| JobscoutError::Network(format!("{url}: body read failed: {e}")))
    }

    /// POST a JSON body (with optional bearer auth) and parse the JSON reply.
    pub async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response = self
            .execute_with_retry(url, || {
                let mut req = self.client.post(url).json(body);
                if let Some(token) = bearer {
                    req = req.bearer_auth(token);
                }
                req
            })
            .await?;

        response
            .json()
            .await
            .map_err(|e| JobscoutError::Network(format!("{url}: invalid JSON reply: {e}")))
    }

    /// Issue a request, retrying transient failures per the policy.
    ///
    /// Retryable: connect/timeout errors, 5xx, 429. Everything else
    /// (other 4xx, malformed URL) fails immediately.
    async fn execute_with_retry<F>(&self, url: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt: u32 = 0;

        loop {
            let outcome = build().send().await;

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!(url, attempt = attempt + 1, "fetch succeeded");
                        return Ok(response);
                    }
                    if !is_retryable_status(status) {
                        return Err(JobscoutError::Network(format!("{url}: HTTP {status}")));
                    }
                    if attempt + 1 >= self.policy.max_attempts {
                        return Err(JobscoutError::Network(format!(
                            "{url}: HTTP {status} after {} attempts",
                            attempt + 1
                        )));
                    }
                    warn!(url, %status, attempt = attempt + 1, "retryable status, backing off");
                }
                Err(e) => {
                    if e.is_builder() {
                        return Err(JobscoutError::validation(format!("bad request URL: {e}")));
                    }
                    if attempt + 1 >= self.policy.max_attempts {
                        return Err(JobscoutError::Network(format!(
                            "{url}: {e} after {} attempts",
                            attempt + 1
                        )));
                    }
                    warn!(url, error = %e, attempt = attempt + 1, "transient error, backing off");
                }
            }

            tokio::time::sleep(self.policy.delay_for(attempt)).await;
            attempt += 1;
        }
    }
}

/// HTTP statuses worth another attempt: server errors and rate limiting.
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quick_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(5), Duration::from_millis(20))
    }

    #[tokio::test]
    async fn retries_5xx_then_succeeds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let client = FetchClient::new(quick_policy(3), 5).unwrap();
        let body = client
            .get_text(&format!("{}/flaky", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "recovered");
    }

    #[tokio::test]
    async fn exhausts_retry_budget_on_persistent_5xx() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = FetchClient::new(quick_policy(3), 5).unwrap();
        let err = client
            .get_text(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[tokio::test]
    async fn does_not_retry_404() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = FetchClient::new(quick_policy(3), 5).unwrap();
        let err = client
            .get_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn retries_429_on_post() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = FetchClient::new(quick_policy(4), 5).unwrap();
        let reply = client
            .post_json(
                &format!("{}/api", server.uri()),
                Some("sk-test"),
                &serde_json::json!({"input": ["x"]}),
            )
            .await
            .unwrap();
        assert_eq!(reply["ok"], serde_json::json!(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2), Duration::from_secs(20));
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(2), Duration::from_secs(8));
        // 2 * 2^4 = 32s would exceed the ceiling
        assert_eq!(policy.delay_for(4), Duration::from_secs(20));
    }

    #[test]
    fn retryable_status_classification() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }
}

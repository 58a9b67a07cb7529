//! HTTP transport with status-based retries.
//!
//! Every Myriad call goes through [`Transport`], which owns the reqwest
//! client, attaches the `x-api-key` header, and retries transient status
//! codes on idempotent-enough methods (GET and POST). Network-level
//! failures are not retried; they surface immediately.

use std::time::{Duration, Instant};

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::MyriadError;
use crate::metrics;

/// Statuses worth retrying: rate limiting and transient server-side errors.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retry schedule for upstream requests.
///
/// `max_retries` counts retries beyond the initial attempt, so the default
/// of 3 allows up to 4 requests total. The first retry fires immediately;
/// later ones back off exponentially from `backoff_base` (0s, 1s, 2s with
/// the defaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Base delay for the exponential backoff.
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Whether a response status qualifies for a retry.
    pub fn retryable_status(status: StatusCode) -> bool {
        RETRYABLE_STATUSES.contains(&status.as_u16())
    }

    /// Whether requests with this method may be retried at all.
    pub fn retryable_method(method: &Method) -> bool {
        *method == Method::GET || *method == Method::POST
    }

    /// Delay before the `retry`-th retry (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            Duration::ZERO
        } else {
            self.backoff_base * 2u32.pow(retry - 2)
        }
    }
}

/// Shared HTTP plumbing for the Myriad API.
#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl Transport {
    /// Build a transport against `base_url` with a per-request `timeout`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, MyriadError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry schedule. Mostly useful to shrink backoff in tests.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` with the given query string, returning the parsed JSON.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, MyriadError> {
        self.execute(Method::GET, path, query, None::<&Value>).await
    }

    /// POST `body` as JSON to `path`, returning the parsed JSON.
    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<Value, MyriadError>
    where
        B: Serialize + ?Sized,
    {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Value, MyriadError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, path);
        let total_attempts = if RetryPolicy::retryable_method(&method) {
            self.retry.max_retries + 1
        } else {
            1
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if attempt > 1 {
                let delay = self.retry.backoff(attempt - 1);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            let mut request = self.http.request(method.clone(), url.as_str());
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(key) = &self.api_key {
                request = request.header("x-api-key", key);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(%method, url, attempt, "upstream request");
            let started = Instant::now();
            let response = request.send().await.inspect_err(|_| {
                metrics::inc_myriad_failures(path);
            })?;
            metrics::record_myriad_latency(started, path);

            let status = response.status();
            if status.is_success() {
                metrics::inc_myriad_requests(path, status.as_u16());
                return response.json::<Value>().await.map_err(MyriadError::from);
            }

            let retryable = RetryPolicy::retryable_status(status);
            if retryable && attempt < total_attempts {
                warn!(%status, attempt, url, "transient upstream status, retrying");
                metrics::inc_myriad_retries(path);
                continue;
            }

            metrics::inc_myriad_requests(path, status.as_u16());
            metrics::inc_myriad_failures(path);
            let body = response.text().await.unwrap_or_default();
            if retryable && total_attempts > 1 {
                return Err(MyriadError::RetriesExhausted {
                    attempts: attempt,
                    status,
                    body,
                });
            }
            return Err(MyriadError::Status { status, body });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            backoff_base: Duration::from_millis(1),
        }
    }

    fn transport(server: &MockServer) -> Transport {
        Transport::new(&server.uri(), Some("test-key".to_string()), Duration::from_secs(5))
            .unwrap()
            .with_retry(fast_retry())
    }

    #[test]
    fn backoff_is_immediate_then_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(2));
        assert_eq!(policy.backoff(4), Duration::from_secs(4));
    }

    #[test]
    fn retryable_statuses_cover_rate_limits_and_server_errors() {
        for code in [429u16, 500, 502, 503, 504] {
            assert!(RetryPolicy::retryable_status(
                StatusCode::from_u16(code).unwrap()
            ));
        }
        for code in [200u16, 400, 401, 404, 422] {
            assert!(!RetryPolicy::retryable_status(
                StatusCode::from_u16(code).unwrap()
            ));
        }
    }

    #[tokio::test]
    async fn get_returns_parsed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/markets"))
            .and(query_param("page", "1"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let value = transport(&server)
            .get("markets", &[("page", "1".to_string())])
            .await
            .unwrap();
        assert_eq!(value, json!({"data": []}));
    }

    #[tokio::test]
    async fn post_body_reaches_upstream_verbatim() {
        let server = MockServer::start().await;
        let body = json!({"market_slug": "btc", "outcome_id": 0, "action": "buy", "value": 50.0});
        Mock::given(method("POST"))
            .and(path("/markets/quote"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"price": 0.42})))
            .expect(1)
            .mount(&server)
            .await;

        let value = transport(&server)
            .post_json("markets/quote", &body)
            .await
            .unwrap();
        assert_eq!(value, json!({"price": 0.42}));
    }

    #[tokio::test]
    async fn recovers_after_three_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/markets"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/markets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let value = transport(&server).get("markets", &[]).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn gives_up_after_exhausting_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/markets"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .expect(4)
            .mount(&server)
            .await;

        let err = transport(&server).get("markets", &[]).await.unwrap_err();
        match err {
            MyriadError::RetriesExhausted {
                attempts,
                status,
                body,
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_is_retried_like_get() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/markets/quote"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/markets/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"shares": 10.0})))
            .expect(1)
            .mount(&server)
            .await;

        let value = transport(&server)
            .post_json("markets/quote", &json!({"outcome_id": 0}))
            .await
            .unwrap();
        assert_eq!(value, json!({"shares": 10.0}));
    }

    #[tokio::test]
    async fn client_errors_fail_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/markets/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .expect(1)
            .mount(&server)
            .await;

        let err = transport(&server).get("markets/nope", &[]).await.unwrap_err();
        match err {
            MyriadError::Status { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "not found");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn trailing_slash_on_base_url_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/questions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let base = format!("{}/", server.uri());
        let t = Transport::new(&base, None, Duration::from_secs(5))
            .unwrap()
            .with_retry(fast_retry());
        assert!(t.get("questions", &[]).await.is_ok());
    }
}

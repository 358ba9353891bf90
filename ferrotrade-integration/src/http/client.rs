use crate::error::Error;
use crate::http::{BuildStrategy, HttpParser, RestRequest};
use crate::rate_limit::{Priority, RateLimiter};
use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const RETRYABLE_STATUS: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Retry/backoff policy shared by every vendor [`RestClient`] (spec.md §4.1, env vars
/// `HTTP_RETRIES`/`HTTP_BACKOFF`/`HTTP_TIMEOUT`).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Configurable Http client capable of executing signed [`RestRequest`]s, honoring a shared
/// [`RateLimiter`] and retrying transient failures with jittered exponential backoff
/// (spec.md §4.1).
#[derive(Clone)]
pub struct RestClient<Signer, Parser> {
    http: reqwest::Client,
    base_url: Url,
    signer: Signer,
    parser: Parser,
    rate_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl<Signer, Parser> RestClient<Signer, Parser>
where
    Signer: BuildStrategy,
    Parser: HttpParser,
{
    pub fn new(
        base_url: Url,
        signer: Signer,
        parser: Parser,
        rate_limiter: RateLimiter,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            signer,
            parser,
            rate_limiter,
            retry,
        }
    }

    /// Execute a [`RestRequest`], retrying on `{429, 500, 502, 503, 504}` up to
    /// `retry.max_retries` times with jittered exponential backoff, honoring a server-sent
    /// `Retry-After` header when present (spec.md §4.1).
    pub async fn execute<Request>(&self, request: Request) -> Result<Request::Response, Error>
    where
        Request: RestRequest,
    {
        let mut attempt = 0u32;
        loop {
            self.rate_limiter.acquire(Priority::Normal).await;

            let url = self.build_url(&request);
            let builder = self
                .http
                .request(request.method(), url)
                .timeout(self.retry.timeout);
            let built = self.signer.build(&request, builder)?;

            let response = self.http.execute(built).await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes = response.bytes().await.map_err(Error::from)?;
                        return self.parser.parse(status, &bytes);
                    }

                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .map(Duration::from_secs);

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        self.rate_limiter.report_violation().await;
                    }

                    let can_retry = Request::retryable()
                        && RETRYABLE_STATUS.contains(&status)
                        && attempt < self.retry.max_retries;

                    if !can_retry {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::HttpResponse(status, body));
                    }

                    attempt += 1;
                    let backoff = retry_after.unwrap_or_else(|| self.jittered_backoff(attempt));
                    warn!(
                        attempt,
                        status = %status,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying vendor HTTP request"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(error) if error.is_timeout() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let backoff = self.jittered_backoff(attempt);
                    debug!(attempt, "vendor HTTP request timed out, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => return Err(Error::from(error)),
            }
        }
    }

    fn build_url<Request: RestRequest>(&self, request: &Request) -> Url {
        let mut url = self
            .base_url
            .join(&request.path())
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in request.query_params() {
                pairs.append_pair(key, &value);
            }
        }
        url
    }

    fn jittered_backoff(&self, attempt: u32) -> Duration {
        let exp = self.retry.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter_ms = rand::rng().random_range(0..=50u64);
        exp + Duration::from_millis(jitter_ms)
    }
}

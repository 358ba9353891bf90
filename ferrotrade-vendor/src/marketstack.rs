use crate::client::VendorClient;
use crate::error::VendorError;
use async_trait::async_trait;
use ferrotrade_core::{Bar, Bars, FetchRequest, Interval, VendorId};
use ferrotrade_integration::error::Error as IntegrationError;
use ferrotrade_integration::http::client::{RestClient, RetryPolicy};
use ferrotrade_integration::http::{HttpParser, PublicNoHeaders, RestRequest};
use ferrotrade_integration::rate_limit::RateLimiter;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Marketstack's free/EOD endpoint only carries end-of-day data; every intraday interval is
/// unsupported (spec.md §4.1).
fn require_daily(interval: Interval) -> Result<(), VendorError> {
    match interval {
        Interval::Day1 => Ok(()),
        other => Err(VendorError::UnsupportedInterval {
            vendor: VendorId::Marketstack,
            interval: other.as_canonical().to_string(),
        }),
    }
}

#[derive(Debug, Clone, Serialize)]
struct EodRequest {
    symbols: String,
    access_key: String,
    limit: u32,
}

impl RestRequest for EodRequest {
    type Response = EodResponse;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("v1/eod")
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("symbols", self.symbols.clone()),
            ("access_key", self.access_key.clone()),
            ("limit", self.limit.to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct EodResponse {
    #[serde(default)]
    data: Vec<RawEod>,
}

#[derive(Debug, Deserialize)]
struct RawEod {
    date: chrono::DateTime<chrono::Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorWrapper {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

struct Parser;

impl HttpParser for Parser {
    type ApiError = ApiErrorWrapper;

    fn parse_api_error(&self, status: StatusCode, error: ApiErrorWrapper) -> IntegrationError {
        IntegrationError::HttpResponse(status, error.error.message)
    }
}

/// Marketstack end-of-day client (spec.md §4.1).
pub struct MarketstackClient {
    rest: RestClient<PublicNoHeaders, Parser>,
    api_key: Option<String>,
}

impl MarketstackClient {
    pub fn new(api_key: Option<String>) -> Self {
        let rest = RestClient::new(
            Url::parse("https://api.marketstack.com/").expect("static base url"),
            PublicNoHeaders,
            Parser,
            RateLimiter::new(5, Duration::from_secs(60)),
            RetryPolicy::default(),
        );
        Self { rest, api_key }
    }
}

#[async_trait]
impl VendorClient for MarketstackClient {
    fn vendor_id(&self) -> VendorId {
        VendorId::Marketstack
    }

    async fn fetch_bars(&self, request: FetchRequest) -> Result<Bars, VendorError> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(VendorError::MissingCredentials {
                vendor: VendorId::Marketstack,
            });
        };
        require_daily(request.interval)?;

        let req = EodRequest {
            symbols: request.symbol.as_str().to_string(),
            access_key: api_key,
            limit: request.limit.unwrap_or(100) as u32,
        };

        let mut bars = Bars::new(request.symbol.clone(), VendorId::Marketstack, "marketstack");

        let response = match self.rest.execute(req).await {
            Ok(response) => response,
            Err(error) => {
                warn!(symbol = %request.symbol, error = %error, "marketstack fetch failed");
                return Ok(bars);
            }
        };

        for d in response.data {
            bars.push(Bar::new(d.date, d.open, d.high, d.low, d.close, d.volume));
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_daily_interval_is_supported() {
        assert!(require_daily(Interval::Day1).is_ok());
        assert!(matches!(
            require_daily(Interval::Min5),
            Err(VendorError::UnsupportedInterval { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_without_api_key_fails_fast() {
        let client = MarketstackClient::new(None);
        let request = FetchRequest::new(
            ferrotrade_core::Symbol::new("AAPL"),
            Interval::Day1,
        );
        let result = client.fetch_bars(request).await;
        assert!(matches!(
            result,
            Err(VendorError::MissingCredentials { .. })
        ));
    }
}

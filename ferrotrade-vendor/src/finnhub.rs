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

fn normalize_interval(interval: Interval) -> Result<&'static str, VendorError> {
    Ok(match interval {
        Interval::Min1 => "1",
        Interval::Min5 => "5",
        Interval::Min15 => "15",
        Interval::Min30 => "30",
        Interval::Hour1 => "60",
        Interval::Day1 => "D",
    })
}

#[derive(Debug, Clone, Serialize)]
struct CandleRequest {
    symbol: String,
    resolution: &'static str,
    from: i64,
    to: i64,
    token: String,
}

impl RestRequest for CandleRequest {
    type Response = CandleResponse;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("api/v1/stock/candle")
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", self.symbol.clone()),
            ("resolution", self.resolution.to_string()),
            ("from", self.from.to_string()),
            ("to", self.to.to_string()),
            ("token", self.token.clone()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

struct Parser;

impl HttpParser for Parser {
    type ApiError = ApiError;

    fn parse_api_error(&self, status: StatusCode, error: ApiError) -> IntegrationError {
        IntegrationError::HttpResponse(status, error.error)
    }
}

/// Finnhub stock candle client (spec.md §4.1).
pub struct FinnhubClient {
    rest: RestClient<PublicNoHeaders, Parser>,
    api_key: Option<String>,
}

impl FinnhubClient {
    pub fn new(api_key: Option<String>) -> Self {
        let rest = RestClient::new(
            Url::parse("https://finnhub.io/").expect("static base url"),
            PublicNoHeaders,
            Parser,
            RateLimiter::new(30, Duration::from_secs(1)),
            RetryPolicy::default(),
        );
        Self { rest, api_key }
    }
}

#[async_trait]
impl VendorClient for FinnhubClient {
    fn vendor_id(&self) -> VendorId {
        VendorId::Finnhub
    }

    async fn fetch_bars(&self, request: FetchRequest) -> Result<Bars, VendorError> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(VendorError::MissingCredentials {
                vendor: VendorId::Finnhub,
            });
        };
        let resolution = normalize_interval(request.interval)?;

        let now = chrono::Utc::now();
        let req = CandleRequest {
            symbol: request.symbol.as_str().to_string(),
            resolution,
            from: request.start.unwrap_or(now - chrono::Duration::days(5)).timestamp(),
            to: request.end.unwrap_or(now).timestamp(),
            token: api_key,
        };

        let mut bars = Bars::new(request.symbol.clone(), VendorId::Finnhub, "finnhub");

        let response = match self.rest.execute(req).await {
            Ok(response) => response,
            Err(error) => {
                warn!(symbol = %request.symbol, error = %error, "finnhub fetch failed");
                return Ok(bars);
            }
        };

        if response.s != "ok" {
            return Ok(bars);
        }

        for i in 0..response.t.len() {
            let Some(timestamp) = chrono::DateTime::from_timestamp(response.t[i], 0) else {
                continue;
            };
            bars.push(Bar::new(
                timestamp,
                response.o[i],
                response.h[i],
                response.l[i],
                response.c[i],
                response.v[i],
            ));
        }
        Ok(bars)
    }
}

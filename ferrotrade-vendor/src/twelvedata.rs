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
        Interval::Min1 => "1min",
        Interval::Min5 => "5min",
        Interval::Min15 => "15min",
        Interval::Min30 => "30min",
        Interval::Hour1 => "1h",
        Interval::Day1 => "1day",
    })
}

#[derive(Debug, Clone, Serialize)]
struct TimeSeriesRequest {
    symbol: String,
    interval: &'static str,
    apikey: String,
    outputsize: u32,
}

impl RestRequest for TimeSeriesRequest {
    type Response = TimeSeriesResponse;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("time_series")
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("symbol", self.symbol.clone()),
            ("interval", self.interval.to_string()),
            ("apikey", self.apikey.clone()),
            ("outputsize", self.outputsize.to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    values: Vec<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

struct Parser;

impl HttpParser for Parser {
    type ApiError = ApiError;

    fn parse_api_error(&self, status: StatusCode, error: ApiError) -> IntegrationError {
        IntegrationError::HttpResponse(status, error.message)
    }
}

/// TwelveData time-series client, a common fallback target for AlphaVantage daily requests
/// (spec.md §4.1).
pub struct TwelveDataClient {
    rest: RestClient<PublicNoHeaders, Parser>,
    api_key: Option<String>,
}

impl TwelveDataClient {
    pub fn new(api_key: Option<String>) -> Self {
        let rest = RestClient::new(
            Url::parse("https://api.twelvedata.com/").expect("static base url"),
            PublicNoHeaders,
            Parser,
            RateLimiter::new(8, Duration::from_secs(60)),
            RetryPolicy::default(),
        );
        Self { rest, api_key }
    }
}

#[async_trait]
impl VendorClient for TwelveDataClient {
    fn vendor_id(&self) -> VendorId {
        VendorId::TwelveData
    }

    async fn fetch_bars(&self, request: FetchRequest) -> Result<Bars, VendorError> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(VendorError::MissingCredentials {
                vendor: VendorId::TwelveData,
            });
        };
        let interval = normalize_interval(request.interval)?;

        let req = TimeSeriesRequest {
            symbol: request.symbol.as_str().to_string(),
            interval,
            apikey: api_key,
            outputsize: request.limit.unwrap_or(100) as u32,
        };

        let mut bars = Bars::new(request.symbol.clone(), VendorId::TwelveData, "twelvedata");

        let response = match self.rest.execute(req).await {
            Ok(response) => response,
            Err(error) => {
                warn!(symbol = %request.symbol, error = %error, "twelvedata fetch failed");
                return Ok(bars);
            }
        };

        for v in response.values {
            let Ok(timestamp) = parse_td_timestamp(&v.datetime) else {
                continue;
            };
            bars.push(Bar::new(
                timestamp,
                v.open.parse().unwrap_or(f64::NAN),
                v.high.parse().unwrap_or(f64::NAN),
                v.low.parse().unwrap_or(f64::NAN),
                v.close.parse().unwrap_or(f64::NAN),
                v.volume.parse().unwrap_or(0.0),
            ));
        }
        Ok(bars)
    }
}

fn parse_td_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, chrono::ParseError> {
    use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&dt));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")?;
    Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid")))
}

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
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// AlphaVantage intraday intervals use minute-resolution function calls; daily data uses a
/// distinct `TIME_SERIES_DAILY` function (spec.md §4.1 daily remap).
fn normalize_interval(interval: Interval) -> Result<(&'static str, Option<&'static str>), VendorError> {
    match interval {
        Interval::Min1 => Ok(("TIME_SERIES_INTRADAY", Some("1min"))),
        Interval::Min5 => Ok(("TIME_SERIES_INTRADAY", Some("5min"))),
        Interval::Min15 => Ok(("TIME_SERIES_INTRADAY", Some("15min"))),
        Interval::Min30 => Ok(("TIME_SERIES_INTRADAY", Some("30min"))),
        Interval::Hour1 => Ok(("TIME_SERIES_INTRADAY", Some("60min"))),
        Interval::Day1 => Ok(("TIME_SERIES_DAILY", None)),
    }
}

#[derive(Debug, Clone, Serialize)]
struct SeriesRequest {
    function: &'static str,
    symbol: String,
    interval: Option<&'static str>,
    apikey: String,
    outputsize: &'static str,
}

impl RestRequest for SeriesRequest {
    type Response = SeriesResponse;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("query")
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("function", self.function.to_string()),
            ("symbol", self.symbol.clone()),
            ("apikey", self.apikey.clone()),
            ("outputsize", self.outputsize.to_string()),
        ];
        if let Some(interval) = self.interval {
            params.push(("interval", interval.to_string()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct SeriesResponse(serde_json::Map<String, serde_json::Value>);

impl SeriesResponse {
    /// AlphaVantage nests the series under a key like `"Time Series (Daily)"` whose exact
    /// wording depends on `function`/`interval`; find it by prefix rather than hard-coding it.
    fn series(self) -> Option<BTreeMap<String, RawPoint>> {
        self.0
            .into_iter()
            .find(|(key, _)| key.starts_with("Time Series"))
            .and_then(|(_, value)| serde_json::from_value(value).ok())
    }
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "Error Message", default)]
    error_message: String,
    #[serde(rename = "Note", default)]
    note: String,
}

struct Parser;

impl HttpParser for Parser {
    type ApiError = ApiError;

    fn parse_api_error(&self, status: StatusCode, error: ApiError) -> IntegrationError {
        let message = if !error.error_message.is_empty() {
            error.error_message
        } else {
            error.note
        };
        IntegrationError::HttpResponse(status, message)
    }
}

/// AlphaVantage historical bars client. On an empty daily response, delegates to Yahoo then
/// TwelveData (spec.md §4.1).
pub struct AlphaVantageClient {
    rest: RestClient<PublicNoHeaders, Parser>,
    api_key: Option<String>,
}

impl AlphaVantageClient {
    pub fn new(api_key: Option<String>) -> Self {
        let rest = RestClient::new(
            Url::parse("https://www.alphavantage.co/").expect("static base url"),
            PublicNoHeaders,
            Parser,
            RateLimiter::new(5, Duration::from_secs(60)),
            RetryPolicy::default(),
        );
        Self { rest, api_key }
    }
}

#[async_trait]
impl VendorClient for AlphaVantageClient {
    fn vendor_id(&self) -> VendorId {
        VendorId::AlphaVantage
    }

    async fn fetch_bars(&self, request: FetchRequest) -> Result<Bars, VendorError> {
        let Some(api_key) = self.api_key.clone() else {
            return Err(VendorError::MissingCredentials {
                vendor: VendorId::AlphaVantage,
            });
        };
        let (function, interval) = normalize_interval(request.interval)?;

        let req = SeriesRequest {
            function,
            symbol: request.symbol.as_str().to_string(),
            interval,
            apikey: api_key,
            outputsize: "compact",
        };

        let mut bars = Bars::new(request.symbol.clone(), VendorId::AlphaVantage, "alphavantage");

        let response = match self.rest.execute(req).await {
            Ok(response) => response,
            Err(error) => {
                warn!(symbol = %request.symbol, error = %error, "alphavantage fetch failed");
                return Ok(bars);
            }
        };

        let Some(series) = response.series() else {
            return Ok(bars);
        };

        for (ts, point) in series {
            let Ok(timestamp) = parse_av_timestamp(&ts) else {
                continue;
            };
            let (open, high, low, close, volume) = (
                point.open.parse().unwrap_or(f64::NAN),
                point.high.parse().unwrap_or(f64::NAN),
                point.low.parse().unwrap_or(f64::NAN),
                point.close.parse().unwrap_or(f64::NAN),
                point.volume.parse().unwrap_or(0.0),
            );
            bars.push(Bar::new(timestamp, open, high, low, close, volume));
        }
        Ok(bars)
    }
}

fn parse_av_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, chrono::ParseError> {
    use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&dt));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")?;
    Ok(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid")))
}

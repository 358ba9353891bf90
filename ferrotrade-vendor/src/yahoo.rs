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
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tracing::warn;
use url::Url;

const CIRCUIT_THRESHOLD: u32 = 5;
const CIRCUIT_OPEN_SECS: u64 = 60;

/// Process-wide Yahoo throttle circuit breaker (spec.md §4.1): opens a 60-second block after
/// 5 consecutive throttle events across every [`YahooClient`] instance in the process.
struct CircuitBreaker {
    consecutive_throttles: AtomicU32,
    opened_at_epoch_secs: AtomicU64,
}

static CIRCUIT: CircuitBreaker = CircuitBreaker {
    consecutive_throttles: AtomicU32::new(0),
    opened_at_epoch_secs: AtomicU64::new(0),
};

impl CircuitBreaker {
    fn is_open(&self) -> bool {
        let opened_at = self.opened_at_epoch_secs.load(Ordering::Relaxed);
        if opened_at == 0 {
            return false;
        }
        now_secs() < opened_at + CIRCUIT_OPEN_SECS
    }

    fn record_throttle(&self) {
        let count = self.consecutive_throttles.fetch_add(1, Ordering::Relaxed) + 1;
        if count >= CIRCUIT_THRESHOLD {
            self.opened_at_epoch_secs.store(now_secs(), Ordering::Relaxed);
        }
    }

    fn record_success(&self) {
        self.consecutive_throttles.store(0, Ordering::Relaxed);
    }
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

fn normalize_interval(interval: Interval) -> Result<&'static str, VendorError> {
    Ok(match interval {
        Interval::Min1 => "1m",
        Interval::Min5 => "5m",
        Interval::Min15 => "15m",
        Interval::Min30 => "30m",
        Interval::Hour1 => "60m",
        Interval::Day1 => "1d",
    })
}

#[derive(Debug, Clone, Serialize)]
struct ChartRequest {
    symbol: String,
    interval: &'static str,
    range: &'static str,
}

impl RestRequest for ChartRequest {
    type Response = ChartResponse;

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("v8/finance/chart/{}", self.symbol))
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("interval", self.interval.to_string()),
            ("range", self.range.to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    description: String,
}

struct Parser;

impl HttpParser for Parser {
    type ApiError = ApiError;

    fn parse_api_error(&self, status: StatusCode, error: ApiError) -> IntegrationError {
        IntegrationError::HttpResponse(status, error.description)
    }
}

/// Yahoo Finance chart client. Never requires credentials, so it is the universal fallback
/// vendor; guarded by a process-wide [`CircuitBreaker`] (spec.md §4.1).
pub struct YahooClient {
    rest: RestClient<PublicNoHeaders, Parser>,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        let rest = RestClient::new(
            Url::parse("https://query1.finance.yahoo.com/").expect("static base url"),
            PublicNoHeaders,
            Parser,
            RateLimiter::new(60, Duration::from_secs(60)),
            RetryPolicy::default(),
        );
        Self { rest }
    }
}

#[async_trait]
impl VendorClient for YahooClient {
    fn vendor_id(&self) -> VendorId {
        VendorId::Yahoo
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    async fn fetch_bars(&self, request: FetchRequest) -> Result<Bars, VendorError> {
        let mut bars = Bars::new(request.symbol.clone(), VendorId::Yahoo, "yahoo");

        if CIRCUIT.is_open() {
            return Err(VendorError::Transport(IntegrationError::HttpResponse(
                StatusCode::SERVICE_UNAVAILABLE,
                "yahoo circuit breaker open".to_string(),
            )));
        }

        let interval = normalize_interval(request.interval)?;
        let req = ChartRequest {
            symbol: request.symbol.as_str().to_string(),
            interval,
            range: if matches!(request.interval, Interval::Day1) {
                "1y"
            } else {
                "5d"
            },
        };

        let response = match self.rest.execute(req).await {
            Ok(response) => response,
            Err(IntegrationError::HttpResponse(StatusCode::TOO_MANY_REQUESTS, _)) => {
                CIRCUIT.record_throttle();
                warn!(symbol = %request.symbol, "yahoo throttled request");
                return Ok(bars);
            }
            Err(error) => {
                warn!(symbol = %request.symbol, error = %error, "yahoo fetch failed");
                return Ok(bars);
            }
        };
        CIRCUIT.record_success();

        let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(bars);
        };
        let Some(quote) = result.indicators.quote.into_iter().next() else {
            return Ok(bars);
        };

        for i in 0..result.timestamp.len() {
            let (Some(o), Some(h), Some(l), Some(c)) = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
            ) else {
                continue;
            };
            let v = quote.volume.get(i).copied().flatten().unwrap_or(0.0);
            let Some(timestamp) = chrono::DateTime::from_timestamp(result.timestamp[i], 0) else {
                continue;
            };
            bars.push(Bar::new(timestamp, o, h, l, c, v));
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_opens_after_five_consecutive_throttles() {
        CIRCUIT.consecutive_throttles.store(0, Ordering::Relaxed);
        CIRCUIT.opened_at_epoch_secs.store(0, Ordering::Relaxed);
        for _ in 0..4 {
            CIRCUIT.record_throttle();
            assert!(!CIRCUIT.is_open());
        }
        CIRCUIT.record_throttle();
        assert!(CIRCUIT.is_open());
        CIRCUIT.record_success();
    }
}

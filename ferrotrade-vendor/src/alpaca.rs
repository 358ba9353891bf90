use crate::client::VendorClient;
use crate::error::VendorError;
use async_trait::async_trait;
use ferrotrade_core::{Bar, Bars, FetchRequest, Interval, VendorId};
use ferrotrade_integration::error::Error as IntegrationError;
use ferrotrade_integration::http::client::{RestClient, RetryPolicy};
use ferrotrade_integration::http::{BuildStrategy, HttpParser, RestRequest};
use ferrotrade_integration::rate_limit::RateLimiter;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use tracing::warn;
use url::Url;

fn normalize_interval(interval: Interval) -> Result<&'static str, VendorError> {
    Ok(match interval {
        Interval::Min1 => "1Min",
        Interval::Min5 => "5Min",
        Interval::Min15 => "15Min",
        Interval::Min30 => "30Min",
        Interval::Hour1 => "1Hour",
        Interval::Day1 => "1Day",
    })
}

#[derive(Debug, Clone, Serialize)]
struct BarsRequest {
    symbols: String,
    timeframe: &'static str,
    start: Option<String>,
    end: Option<String>,
    limit: Option<usize>,
}

impl RestRequest for BarsRequest {
    type Response = BarsResponse;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("v2/stocks/bars")
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbols", self.symbols.clone()),
            ("timeframe", self.timeframe.to_string()),
        ];
        if let Some(start) = &self.start {
            params.push(("start", start.clone()));
        }
        if let Some(end) = &self.end {
            params.push(("end", end.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct BarsResponse {
    #[serde(default)]
    bars: std::collections::HashMap<String, Vec<RawBar>>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "t")]
    timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "v")]
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

struct HeaderAuth {
    key_id: String,
    secret_key: String,
}

impl BuildStrategy for HeaderAuth {
    fn build<Request>(
        &self,
        _: &Request,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Request, IntegrationError>
    where
        Request: RestRequest,
    {
        builder
            .header("APCA-API-KEY-ID", &self.key_id)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
            .build()
            .map_err(IntegrationError::from)
    }
}

struct Parser;

impl HttpParser for Parser {
    type ApiError = ApiError;

    fn parse_api_error(&self, status: StatusCode, error: ApiError) -> IntegrationError {
        IntegrationError::HttpResponse(status, error.message)
    }
}

/// Alpaca Markets historical/live bars client (spec.md §4.1). Grounds the auth-failure
/// protocol: on a second consecutive HTTP 401, fetch fails with `AuthFailed` naming Yahoo as
/// the cheaper fallback vendor.
pub struct AlpacaClient {
    rest: RestClient<HeaderAuth, Parser>,
    credentialed: bool,
}

impl AlpacaClient {
    pub fn new(key_id: Option<String>, secret_key: Option<String>) -> Self {
        let credentialed = key_id.is_some() && secret_key.is_some();
        let rest = RestClient::new(
            Url::parse("https://data.alpaca.markets/").expect("static base url"),
            HeaderAuth {
                key_id: key_id.unwrap_or_default(),
                secret_key: secret_key.unwrap_or_default(),
            },
            Parser,
            RateLimiter::new(200, Duration::from_secs(60)),
            RetryPolicy::default(),
        );
        Self { rest, credentialed }
    }
}

#[async_trait]
impl VendorClient for AlpacaClient {
    fn vendor_id(&self) -> VendorId {
        VendorId::Alpaca
    }

    fn supports_streaming(&self) -> bool {
        self.credentialed
    }

    async fn fetch_bars(&self, request: FetchRequest) -> Result<Bars, VendorError> {
        if !self.credentialed {
            return Err(VendorError::MissingCredentials {
                vendor: VendorId::Alpaca,
            });
        }
        let timeframe = normalize_interval(request.interval)?;

        let req = BarsRequest {
            symbols: request.symbol.as_str().to_string(),
            timeframe,
            start: request.start.map(|t| t.to_rfc3339()),
            end: request.end.map(|t| t.to_rfc3339()),
            limit: request.limit,
        };

        let mut bars = Bars::new(request.symbol.clone(), VendorId::Alpaca, "alpaca");

        let response = match self.rest.execute(req).await {
            Ok(response) => response,
            Err(IntegrationError::HttpResponse(StatusCode::UNAUTHORIZED, _)) => {
                let retry_req = BarsRequest {
                    symbols: request.symbol.as_str().to_string(),
                    timeframe,
                    start: request.start.map(|t| t.to_rfc3339()),
                    end: request.end.map(|t| t.to_rfc3339()),
                    limit: request.limit,
                };
                match self.rest.execute(retry_req).await {
                    Ok(response) => response,
                    Err(IntegrationError::HttpResponse(StatusCode::UNAUTHORIZED, _)) => {
                        return Err(VendorError::AuthFailed {
                            vendor: VendorId::Alpaca,
                            fallback_hint: VendorId::Yahoo,
                        });
                    }
                    Err(error) => {
                        warn!(symbol = %request.symbol, error = %error, "alpaca fetch failed");
                        return Ok(bars);
                    }
                }
            }
            Err(error) => {
                warn!(symbol = %request.symbol, error = %error, "alpaca fetch failed");
                return Ok(bars);
            }
        };

        if let Some(raw) = response.bars.get(request.symbol.as_str()) {
            for b in raw {
                bars.push(Bar::new(b.timestamp, b.open, b.high, b.low, b.close, b.volume));
            }
        }
        Ok(bars)
    }
}

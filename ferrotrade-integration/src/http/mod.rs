use crate::error::Error;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::error;

/// Configurable [`RestClient`](client::RestClient) capable of executing retrying,
/// rate-limited [`RestRequest`]s and parsing responses.
pub mod client;

/// [`RestRequest`] build strategy for the vendor API being interacted with.
///
/// A vendor that requires authenticated [`RestRequest`]s (header or query-string API keys)
/// implements this to sign/annotate the request before it is built.
pub trait BuildStrategy {
    fn build<Request>(
        &self,
        request: &Request,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Request, Error>
    where
        Request: RestRequest;
}

/// [`BuildStrategy`] that adds no headers or query-string signing, for vendors whose auth is
/// entirely embedded in [`RestRequest::query_params`] or [`RestRequest::path`].
#[derive(Debug, Copy, Clone, Default)]
pub struct PublicNoHeaders;

impl BuildStrategy for PublicNoHeaders {
    fn build<Request>(
        &self,
        _: &Request,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Request, Error>
    where
        Request: RestRequest,
    {
        builder.build().map_err(Error::from)
    }
}

/// Http REST request that can be executed by a [`RestClient`](client::RestClient).
pub trait RestRequest {
    /// Expected response type if this request was successful.
    type Response: DeserializeOwned;

    /// Additional Url path to the resource, relative to the client's base Url.
    fn path(&self) -> std::borrow::Cow<'static, str>;

    fn method(&self) -> reqwest::Method {
        reqwest::Method::GET
    }

    /// Query parameters for this request, already vendor-specific key/value pairs.
    fn query_params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Whether this request is allowed to be retried on a 5xx/429 response
    /// (spec.md §4.1: retry policy).
    fn retryable() -> bool {
        true
    }
}

/// Utilised by a [`RestClient`](client::RestClient) to parse a vendor-specific API error out of
/// a non-2xx response body.
pub trait HttpParser {
    type ApiError: DeserializeOwned;

    fn parse<Response>(&self, status: StatusCode, payload: &[u8]) -> Result<Response, Error>
    where
        Response: DeserializeOwned,
    {
        let parse_ok_error = match serde_json::from_slice::<Response>(payload) {
            Ok(response) => return Ok(response),
            Err(serde_error) => serde_error,
        };

        if let Ok(api_error) = serde_json::from_slice::<Self::ApiError>(payload) {
            return Err(self.parse_api_error(status, api_error));
        }

        error!(
            status_code = ?status,
            ?parse_ok_error,
            response_body = %String::from_utf8_lossy(payload),
            "error deserializing HTTP response"
        );

        Err(Error::Deserialise {
            error: parse_ok_error,
            payload: String::from_utf8_lossy(payload).into_owned(),
        })
    }

    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Error;
}

use thiserror::Error;

/// All HTTP/transport errors generated by `ferrotrade-integration` and the
/// vendor clients built on top of it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("HTTP request timed out")]
    HttpTimeout(reqwest::Error),

    #[error("HTTP response (status={0}) error: {1}")]
    HttpResponse(reqwest::StatusCode, String),

    #[error("deserialising JSON error: {error} for payload: {payload}")]
    Deserialise {
        error: serde_json::Error,
        payload: String,
    },

    #[error("error parsing Url: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("vendor authentication failed: {0}")]
    Unauthorized(String),

    #[error("vendor rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("{entity} does not support: {item}")]
    Unsupported { entity: &'static str, item: String },
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        match error {
            error if error.is_timeout() => Self::HttpTimeout(error),
            error => Self::Http(error),
        }
    }
}

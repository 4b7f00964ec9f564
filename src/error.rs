//! Typed errors for the proxy pipeline

use reqwest::StatusCode;
use thiserror::Error;

/// Why a proxy list line was skipped
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("'{line}' is not a URL: {source}")]
    InvalidUri {
        line: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported proxy scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("no host in '{0}'")]
    MissingHost(String),

    #[error("line is not valid UTF-8")]
    NotUtf8(#[source] std::string::FromUtf8Error),
}

/// Why a single proxy check did not succeed
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to build proxied client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("bad return code - {0}")]
    Status(StatusCode),

    #[error("undecodable geolocation response: {0}")]
    Geolocation(#[from] serde_json::Error),

    #[error("check timed out")]
    Timeout,

    #[error("blocked with: '{actual}' - '{expected}'")]
    Mismatch { actual: String, expected: String },
}

impl CheckError {
    /// Build a mismatch error from raw bodies
    pub fn mismatch(actual: &[u8], expected: &[u8]) -> Self {
        CheckError::Mismatch {
            actual: String::from_utf8_lossy(actual).into_owned(),
            expected: String::from_utf8_lossy(expected).into_owned(),
        }
    }
}

/// Why a harvested link could not be turned into a proxy
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("bad link: {0}")]
    InvalidLink(#[from] url::ParseError),

    #[error("wrong scheme {0}")]
    WrongScheme(String),

    #[error("no host given")]
    MissingHost,

    #[error("bad port '{0}'")]
    InvalidPort(String),
}

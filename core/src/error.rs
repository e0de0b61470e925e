//! Fatal errors raised while setting up the API client or building a call.
//!
//! # Design
//! These are defects in calling code or deployment, not runtime outcomes of
//! an exchange. Runtime failures are reported as `Problem` values instead;
//! nothing here is ever converted into one.

use thiserror::Error;

use crate::http::HttpMethod;

/// Errors returned when an `ApiConfig` cannot be turned into a client.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    /// The base URL does not parse as an absolute URL.
    #[error("invalid base url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The base URL is not http or https.
    #[error("unsupported url scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    /// The timeout is not a non-negative integer number of milliseconds.
    #[error("invalid timeout {0:?}, expected milliseconds")]
    InvalidTimeout(String),

    /// The underlying HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors in how a call was made, detected before anything is sent.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request body could not be serialized to JSON.
    #[error("request body for {method} {path} is not serializable: {source}")]
    Serialization {
        method: HttpMethod,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A header value contains bytes HTTP does not allow.
    #[error("invalid value for header {name}: {source}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
}

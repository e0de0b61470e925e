//! Classification of failed exchanges into a closed set of problem kinds.
//!
//! # Design
//! `classify` is a pure function of the exchange outcome and the configured
//! timeout. Rules are checked in a fixed order and the first match wins, so
//! every non-2xx outcome maps to exactly one `Problem`:
//!
//! 1. no response, waited at least the timeout: `Timeout`
//! 2. no response otherwise: `CannotConnect`
//! 3. 500..=599: `Server`
//! 4. 401 or 403: `Unauthorized`
//! 5. 404: `NotFound`
//! 6. any other 4xx: `Rejected`
//! 7. anything else: `Unknown`
//!
//! `BadData` never comes out of `classify`; the client produces it when a 2xx
//! body does not match the expected shape.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::Exchange;

/// Outcome of a client call: the parsed payload or exactly one `Problem`.
pub type ApiResult<T> = Result<T, Problem>;

/// A classified, non-fatal failure of an exchange.
///
/// Serializes as `{"kind": "<kind>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Problem {
    #[error("request timed out")]
    Timeout,
    #[error("cannot connect to server")]
    CannotConnect,
    #[error("server error")]
    Server,
    #[error("not authorized")]
    Unauthorized,
    #[error("resource not found")]
    NotFound,
    #[error("request rejected")]
    Rejected,
    #[error("response did not match the expected shape")]
    BadData,
    #[error("unknown problem")]
    Unknown,
}

/// The kind of message a UI shows for a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    Connectivity,
    Reauthenticate,
    NotFound,
    InvalidRequest,
    RetryLater,
    UnexpectedResponse,
}

impl Problem {
    pub const ALL: [Problem; 8] = [
        Problem::Timeout,
        Problem::CannotConnect,
        Problem::Server,
        Problem::Unauthorized,
        Problem::NotFound,
        Problem::Rejected,
        Problem::BadData,
        Problem::Unknown,
    ];

    /// Wire name of the kind, as used in the `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Problem::Timeout => "timeout",
            Problem::CannotConnect => "cannot-connect",
            Problem::Server => "server",
            Problem::Unauthorized => "unauthorized",
            Problem::NotFound => "not-found",
            Problem::Rejected => "rejected",
            Problem::BadData => "bad-data",
            Problem::Unknown => "unknown",
        }
    }

    /// Classify a status code. `None` for 2xx.
    pub fn from_status(status: u16) -> Option<Problem> {
        match status {
            200..=299 => None,
            500..=599 => Some(Problem::Server),
            401 | 403 => Some(Problem::Unauthorized),
            404 => Some(Problem::NotFound),
            400..=499 => Some(Problem::Rejected),
            _ => Some(Problem::Unknown),
        }
    }

    /// Whether the same request may succeed later without changes.
    pub fn is_temporary(&self) -> bool {
        matches!(
            self,
            Problem::Timeout | Problem::CannotConnect | Problem::Server | Problem::Unknown
        )
    }

    pub fn message_category(&self) -> MessageCategory {
        match self {
            Problem::Timeout | Problem::CannotConnect => MessageCategory::Connectivity,
            Problem::Unauthorized => MessageCategory::Reauthenticate,
            Problem::NotFound => MessageCategory::NotFound,
            Problem::Rejected => MessageCategory::InvalidRequest,
            Problem::Server | Problem::Unknown => MessageCategory::RetryLater,
            Problem::BadData => MessageCategory::UnexpectedResponse,
        }
    }
}

/// Map an exchange to its `Problem`, or `None` when the server answered 2xx.
pub fn classify(exchange: &Exchange, timeout: Duration) -> Option<Problem> {
    match exchange {
        Exchange::NoResponse { elapsed } if *elapsed >= timeout => Some(Problem::Timeout),
        Exchange::NoResponse { .. } => Some(Problem::CannotConnect),
        Exchange::Completed(response) => Problem::from_status(response.status),
    }
}

//! Async API client core for the storefront app.
//!
//! # Overview
//! Sends requests to a configured base URL and turns every outcome into an
//! `ApiResult`: the parsed payload, or exactly one `Problem` kind. Expected
//! failures (no connection, timeout, error status, unexpected body) are
//! values, never panics or `Err` types with sources. Bad configuration is
//! fatal and reported as `ConfigError` at construction; a call that cannot
//! be built (unserializable body, invalid token) is a `RequestError`.
//!
//! # Design
//! - `ApiClient` is built once from an `ApiConfig` and cloned freely; it holds
//!   no mutable state.
//! - Request building and response interpretation are pure (`build_*`,
//!   `parse`, `classify`); only a `Transport` performs I/O.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod problem;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::{ApiConfig, DEFAULT_TIMEOUT_MS};
pub use error::{ConfigError, RequestError};
pub use http::{Exchange, HttpMethod, HttpRequest, HttpResponse, QueryValue};
pub use problem::{classify, ApiResult, MessageCategory, Problem};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Credentials, Enclosure, Episode, FeedResponse, LoginResponse, NewOrder, Order, OrderLine,
    OrderPage, OrderStatus, OrderUpdate, Product, ProductPage, ProductQuery, Session,
};

//! Request builder, response interpreter and async entry points.
//!
//! # Design
//! `ApiClient` holds only immutable data: the validated config, the default
//! headers, and a shared `Transport`. Each call is split into a `build_*`
//! method that produces an `HttpRequest` and `parse`, which turns the
//! resulting `Exchange` into an `ApiResult`. The async `get`/`post`/`put`
//! glue the two around one `Transport::execute`.
//!
//! Mistakes in how a call is made (an unserializable body, a token that is
//! not a valid header value) are `RequestError`s, returned before anything is
//! sent. They never reach `parse` and never become a `Problem`.
//!
//! Clones share the transport, so one client constructed at startup can be
//! handed to every caller.

use std::fmt;
use std::sync::Arc;

use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ConfigError, RequestError};
use crate::http::{Exchange, HttpMethod, HttpRequest, QueryValue};
use crate::problem::{classify, ApiResult, Problem};
use crate::transport::{ReqwestTransport, Transport};

/// Client for the storefront API.
#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    base_url: String,
    headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.config.timeout())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Validate `config` and build a client over a pooled reqwest transport.
    pub fn new(config: ApiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Like `new`, but over a caller-supplied transport.
    pub fn with_transport(
        config: ApiConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            base_url: config.url().trim_end_matches('/').to_string(),
            config,
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("from".to_string(), "app".to_string()),
            ],
            transport,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// A copy of this client that sends `Authorization: Bearer <token>`.
    ///
    /// Fails if the token cannot be carried in a header, for example when it
    /// contains a line break.
    pub fn with_bearer_token(&self, token: &str) -> Result<Self, RequestError> {
        let value = format!("Bearer {token}");
        HeaderValue::from_str(&value).map_err(|source| RequestError::InvalidHeader {
            name: "authorization",
            source,
        })?;
        let mut client = self.clone();
        client
            .headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case("authorization"));
        client.headers.push(("authorization".to_string(), value));
        Ok(client)
    }

    /// # Panics
    /// If `path` is absolute (contains `://`).
    pub fn build_get(&self, path: &str, query: &[(&str, QueryValue)]) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.url_for(path),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers: self.headers.clone(),
            body: None,
        }
    }

    /// # Panics
    /// If `path` is absolute (contains `://`).
    pub fn build_post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, RequestError> {
        self.build_with_body(HttpMethod::Post, path, body)
    }

    /// # Panics
    /// If `path` is absolute (contains `://`).
    pub fn build_put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, RequestError> {
        self.build_with_body(HttpMethod::Put, path, body)
    }

    fn build_with_body<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, RequestError> {
        let body = serde_json::to_string(body).map_err(|source| RequestError::Serialization {
            method,
            path: path.to_string(),
            source,
        })?;
        let mut headers = self.headers.clone();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method,
            url: self.url_for(path),
            query: Vec::new(),
            headers,
            body: Some(body),
        })
    }

    fn url_for(&self, path: &str) -> String {
        assert!(
            !path.contains("://"),
            "request path must be relative to the base url, got {path:?}"
        );
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Interpret a finished exchange.
    ///
    /// Non-2xx outcomes are classified; a 2xx body is parsed as `T`, with an
    /// empty body read as JSON `null`. A body that does not fit `T` is
    /// `Problem::BadData`.
    pub fn parse<T: DeserializeOwned>(&self, exchange: Exchange) -> ApiResult<T> {
        if let Some(problem) = classify(&exchange, self.config.timeout()) {
            warn!("exchange failed: {}", problem.kind());
            return Err(problem);
        }
        let Exchange::Completed(response) = exchange else {
            // classify never passes a missing response
            return Err(Problem::Unknown);
        };
        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| {
            warn!("bad data in {} response: {}", response.status, e);
            Problem::BadData
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> ApiResult<T> {
        debug!("{} {}", request.method, request.url);
        let exchange = self.transport.execute(request).await;
        self.parse(exchange)
    }

    /// GET `path` with `query`, parsing the body as `T`.
    #[tracing::instrument(skip(self, query))]
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, QueryValue)],
    ) -> ApiResult<T> {
        let request = self.build_get(path, query);
        self.send(request).await
    }

    /// POST `body` as JSON to `path`, parsing the reply as `T`.
    ///
    /// The outer `Result` fails only when the body cannot be serialized; no
    /// request is sent in that case.
    #[tracing::instrument(skip(self, body))]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResult<T>, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.build_post(path, body)?;
        Ok(self.send(request).await)
    }

    /// PUT `body` as JSON to `path`, parsing the reply as `T`.
    ///
    /// The outer `Result` fails only when the body cannot be serialized; no
    /// request is sent in that case.
    #[tracing::instrument(skip(self, body))]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<ApiResult<T>, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.build_put(path, body)?;
        Ok(self.send(request).await)
    }
}

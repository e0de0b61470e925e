//! The single I/O seam of the crate.
//!
//! # Design
//! A `Transport` performs exactly one round trip for an `HttpRequest` and
//! reports how it ended as an `Exchange`. It never retries and never fails:
//! anything that prevents a response from arriving is reported as
//! `Exchange::NoResponse` with the time spent waiting, which is all the
//! classifier needs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, Client};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ConfigError;
use crate::http::{Exchange, HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Exchange;
}

/// `Transport` backed by a pooled `reqwest::Client`.
///
/// The configured timeout bounds the whole exchange, body included. Redirects
/// are not followed: a 3xx is the exchange's answer.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    fn no_response(&self, started: Instant, err: &reqwest::Error) -> Exchange {
        let mut elapsed = started.elapsed();
        if err.is_timeout() {
            elapsed = elapsed.max(self.timeout);
        }
        debug!("no response after {:?}: {}", elapsed, err);
        Exchange::NoResponse { elapsed }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Exchange {
        let started = Instant::now();

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = builder.headers(header_map(&request.headers));
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return self.no_response(started, &e),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return self.no_response(started, &e),
        };

        Exchange::Completed(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn header_map(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            }
            _ => debug!("skipping invalid header {:?}", name),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_keeps_valid_headers() {
        let map = header_map(&[
            ("Accept".to_string(), "application/json".to_string()),
            ("From".to_string(), "app".to_string()),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["accept"], "application/json");
    }

    #[test]
    fn header_map_skips_invalid_names() {
        let map = header_map(&[
            ("bad header".to_string(), "x".to_string()),
            ("X-Ok".to_string(), "y".to_string()),
        ]);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("x-ok"));
    }

    #[test]
    fn transport_builds_from_config() {
        let transport = ReqwestTransport::new(&ApiConfig::new("http://localhost:3000", 250)).unwrap();
        assert_eq!(transport.timeout, Duration::from_millis(250));
    }
}

//! HTTP fetcher over reqwest.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::models::{Request, Response};

/// HTTP request timeout in seconds.
/// 30s allows for slow CDN responses while failing fast enough that an
/// offline device falls back to cache without a long hang.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The one seam through which the proxy touches the network. Every
/// failure mode (offline, DNS, timeout) surfaces as `ProxyError::Network`
/// and is recovered locally by the caller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Production fetcher.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ProxyError::Network)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        debug!(url = %request.url(), "fetching from network");

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone());
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        // Capture the body in full before handing the response on, so a
        // store write never observes a partially read stream.
        let body = response.bytes().await?;

        Ok(Response::new(status, headers, body))
    }
}

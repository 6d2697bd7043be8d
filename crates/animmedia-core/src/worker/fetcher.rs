//! Network access seam.
//!
//! The controller only sees `Fetcher`; `HttpFetcher` is the reqwest-backed
//! implementation used against a live origin.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::http::{Method, Request, Response};
use super::FetchError;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Resolves with any HTTP status; only transport failures are errors.
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Fetches site paths from an HTTP origin.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    origin: String,
}

impl HttpFetcher {
    /// `timeout` of `None` leaves requests bounded only by the OS.
    pub fn new(origin: impl Into<String>, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let origin = origin.into();
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(origin));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            origin: origin.trim_end_matches('/').to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Absolute URL for a request URL that may be a site path.
    pub fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if let Some(path) = url.strip_prefix("./") {
            format!("{}/{}", self.origin, path)
        } else if url.starts_with('/') {
            format!("{}{}", self.origin, url)
        } else {
            format!("{}/{}", self.origin, url)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = self.resolve(&request.url);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let response = self.client.request(method, &url).send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();
        debug!(url = %url, status, bytes = body.len(), "Fetched from network");

        Ok(Response {
            url: request.url.clone(),
            status,
            headers,
            body,
        })
    }
}

//! # Beacon Net
//!
//! HTTP loading for the Beacon service worker.
//!
//! The worker never talks to `reqwest` directly: install pre-caching and the
//! fetch passthrough both go through the [`Fetcher`] trait, so the loader can be
//! swapped for an in-memory network in tests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failures. A non-2xx status is not an error here.
#[derive(Error, Debug)]
pub enum NetError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// An outgoing request as seen by the worker.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Override the loader's default deadline for this request.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// A response with its body fully read.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(url: Url, status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            url,
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// 2xx status.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> Result<String, NetError> {
        String::from_utf8(self.body.to_vec()).map_err(|e| NetError::RequestFailed(e.to_string()))
    }
}

/// Anything that can turn a request into a response.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: Request) -> Result<Response, NetError>;
}

/// Settings for [`ResourceLoader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("Beacon/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            max_redirects: 10,
        }
    }
}

/// [`Fetcher`] backed by a real HTTP client.
pub struct ResourceLoader {
    client: Client,
    timeout: Duration,
}

impl ResourceLoader {
    pub fn new(config: LoaderConfig) -> Result<Self, NetError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        debug!(user_agent = %config.user_agent, "Resource loader ready");
        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl Fetcher for ResourceLoader {
    async fn fetch(&self, request: Request) -> Result<Response, NetError> {
        let deadline = request.timeout.unwrap_or(self.timeout);
        debug!(url = %request.url, method = %request.method, "Loading");

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(deadline);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NetError::Timeout(deadline)
            } else {
                NetError::Http(e)
            }
        })?;

        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        trace!(%url, %status, len = body.len(), "Loaded");

        Ok(Response {
            url,
            status,
            headers,
            body,
        })
    }
}

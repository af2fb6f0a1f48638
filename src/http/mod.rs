//! Shared HTTP client pool.
//!
//! Every probe in a batch goes through one reusable [`HttpClient`],
//! configured once before scanning begins with a connection ceiling, an
//! optional upstream proxy, and a per-request timeout. The [`HttpTransport`]
//! trait is the seam between the engine and the wire: the evaluator only
//! ever sees the trait, so tests can substitute a scripted transport.

use crate::error::{ScanError, ScanResult};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{redirect, Method, Proxy};
use std::time::{Duration, Instant};
use url::Url;

/// User agent presented by every probe.
const USER_AGENT: &str = concat!("lancet/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// Settings for the shared HTTP client pool.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Maximum idle connections kept per host.
    pub max_connections: usize,
    /// Optional upstream proxy URL; all probe traffic routes through it.
    pub proxy: Option<String>,
    /// Hard deadline for each request.
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            proxy: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl HttpSettings {
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One concrete HTTP request derived from a (rule, target) pair.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl ProbeRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Short request description used in evidence and logs.
    pub fn request_line(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Fully-buffered snapshot of a probe response.
///
/// Matchers and evidence work off this snapshot; nothing re-reads the wire.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
    pub elapsed: Duration,
}

/// Trait abstracting request execution.
///
/// Implemented by [`HttpClient`] for real traffic and by scripted mocks in
/// tests, keeping the engine free of ambient network state.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute one request, honoring the configured timeout.
    async fn execute(&self, request: &ProbeRequest) -> ScanResult<ProbeResponse>;
}

/// Shared, reusable HTTP transport backed by a reqwest connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build the pool from settings. Called once before scanning begins.
    ///
    /// Certificate validation is disabled: probe targets routinely present
    /// self-signed or mismatched certificates.
    pub fn configure(settings: &HttpSettings) -> ScanResult<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(settings.max_connections)
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(true)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT);

        if let Some(proxy_url) = &settings.proxy {
            let proxy = Proxy::all(proxy_url).map_err(|e| ScanError::InvalidProxy {
                url: proxy_url.clone(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| ScanError::ClientBuild(e.to_string()))?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn execute(&self, request: &ProbeRequest) -> ScanResult<ProbeResponse> {
        let started = Instant::now();

        let mut builder = self
            .inner
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(ScanError::from_reqwest)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(ScanError::from_reqwest)?;

        Ok(ProbeResponse {
            status,
            headers,
            body,
            elapsed: started.elapsed(),
        })
    }
}

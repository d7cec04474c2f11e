//! HTTP client wrapper for control-plane and storage-node requests.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, RequestBuilder, Response, Url};

use crate::api::error::error_for_status;
use crate::config::SdkConfig;
use crate::error::{ArchiveError, Result};

/// Response body delivered as a stream of chunks.
pub type ByteStream = futures::stream::BoxStream<'static, Result<bytes::Bytes>>;

/// HTTP client shared by every request of one connection.
///
/// Cookies set by the server are kept in a jar owned by the client so that
/// values delivered only as cookies can be read back.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    cookies: Arc<Jar>,
    request_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings.
    pub fn new() -> Result<Self> {
        Self::from_config(&SdkConfig::default())
    }

    /// Create a new HTTP client from SDK configuration.
    ///
    /// Applies the user agent and proxy (native targets only). The request
    /// timeout bounds connecting here; whole-request bounds are set per
    /// request through [`HttpClient::request_timeout`], so long downloads are
    /// not cut off.
    pub fn from_config(config: &SdkConfig) -> Result<Self> {
        let cookies = Arc::new(Jar::default());
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let mut builder = Client::builder()
            .cookie_provider(cookies.clone())
            .connect_timeout(request_timeout)
            .user_agent(config.user_agent.clone());

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| ArchiveError::ConfigError(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ArchiveError::ConfigError(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            cookies,
            request_timeout,
        })
    }

    /// Bound for a complete request/response exchange with a small body.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Start building a request.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a request and turn non-success statuses into typed errors.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), body));
        }
        Ok(response)
    }

    /// Read a cookie the server set for `url`.
    pub fn cookie(&self, url: &str, name: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.cookies.cookies(&url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }
}

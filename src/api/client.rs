//! Host-bound connection with request/response handling.

use std::sync::Arc;

use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::{AuthScheme, TokenProvider};
use crate::error::{ArchiveError, Result};
use crate::http::{ByteStream, HttpClient};

/// Provider and header scheme a connection authenticates with.
struct Authenticator {
    provider: Arc<dyn TokenProvider>,
    scheme: AuthScheme,
}

/// An HTTP session bound to one host.
///
/// Every request is sent to `host_address` joined with the request URI and
/// carries the authorization header established when the connection was
/// created.
pub struct Connection {
    host_address: String,
    http: HttpClient,
    authenticator: Option<Authenticator>,
    auth_header: RwLock<Option<String>>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host_address", &self.host_address)
            .field("scheme", &self.authenticator.as_ref().map(|a| a.scheme))
            .finish()
    }
}

impl Connection {
    /// Create an unauthenticated connection.
    pub fn new(host_address: impl Into<String>, http: HttpClient) -> Self {
        Self {
            host_address: normalize_host(host_address.into()),
            http,
            authenticator: None,
            auth_header: RwLock::new(None),
        }
    }

    /// Create a connection authenticated with the provider's current secret.
    pub async fn authenticated(
        host_address: impl Into<String>,
        http: HttpClient,
        provider: Arc<dyn TokenProvider>,
        scheme: AuthScheme,
    ) -> Result<Self> {
        let secret = provider.get_secret_value(false).await?;
        Ok(Self {
            host_address: normalize_host(host_address.into()),
            http,
            authenticator: Some(Authenticator { provider, scheme }),
            auth_header: RwLock::new(Some(scheme.header_value(&secret))),
        })
    }

    /// Base URL every request of this connection goes to.
    pub fn host_address(&self) -> &str {
        &self.host_address
    }

    /// Scheme of the authorization header, if the connection is authenticated.
    pub fn auth_scheme(&self) -> Option<AuthScheme> {
        self.authenticator.as_ref().map(|a| a.scheme)
    }

    /// Re-fetch the secret and replace the authorization header.
    ///
    /// Never called by the library itself.
    pub async fn renew_authentication(&self, force_refresh: bool) -> Result<()> {
        let Some(authenticator) = &self.authenticator else {
            return Err(ArchiveError::Custom(
                "Connection has no token provider".to_string(),
            ));
        };
        let secret = authenticator.provider.get_secret_value(force_refresh).await?;
        *self.auth_header.write().await = Some(authenticator.scheme.header_value(&secret));
        Ok(())
    }

    /// Full URL for a request URI.
    pub fn url(&self, uri: &str) -> String {
        format!("{}{}", self.host_address, uri)
    }

    /// Read a cookie the server set on this connection.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.http.cookie(&self.host_address, name)
    }

    /// Send a request whose whole exchange, body included, is bounded by the
    /// configured request timeout.
    async fn send(
        &self,
        method: Method,
        uri: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response> {
        let timeout = self.http.request_timeout();
        self.send_unbounded(method, uri, |r| build(r).timeout(timeout))
            .await
    }

    /// Send a request with no overall deadline; only connecting is bounded.
    async fn send_unbounded(
        &self,
        method: Method,
        uri: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response> {
        let url = self.url(uri);
        debug!(%method, %url, "api request");
        let mut request = self.http.request(method, &url);
        if let Some(header) = self.auth_header.read().await.as_deref() {
            request = request.header(AUTHORIZATION, header);
        }
        self.http.send(build(request)).await
    }

    /// GET a URI and return the response body as text.
    pub async fn get(&self, uri: &str, query: &[(&str, String)]) -> Result<String> {
        let response = self.send(Method::GET, uri, |r| r.query(query)).await?;
        Ok(response.text().await?)
    }

    /// GET a URI that answers with a non-JSON body.
    pub async fn get_raw(&self, uri: &str) -> Result<String> {
        let response = self
            .send(Method::GET, uri, |r| r.header(ACCEPT, "*/*"))
            .await?;
        Ok(response.text().await?)
    }

    /// GET a URI and deserialize the `data` member of the response envelope.
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        uri: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let text = self.get(uri, query).await?;
        parse_data(&text)
    }

    /// POST a JSON body and return the response body as text.
    pub async fn post<B: Serialize + ?Sized>(&self, uri: &str, body: Option<&B>) -> Result<String> {
        let response = self
            .send(Method::POST, uri, |r| match body {
                Some(body) => r.json(body),
                None => r,
            })
            .await?;
        Ok(response.text().await?)
    }

    /// POST a JSON body and deserialize the `data` member of the response envelope.
    pub async fn post_data<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        uri: &str,
        body: &B,
    ) -> Result<T> {
        let text = self.post(uri, Some(body)).await?;
        parse_data(&text)
    }

    /// DELETE a URI.
    pub async fn delete(&self, uri: &str) -> Result<()> {
        self.send(Method::DELETE, uri, |r| r).await?;
        Ok(())
    }

    /// GET a URI and return the body as a byte stream.
    ///
    /// The body may take arbitrarily long to arrive, so the request timeout
    /// does not apply.
    pub async fn get_stream(&self, uri: &str) -> Result<ByteStream> {
        let response = self
            .send_unbounded(Method::GET, uri, |r| r.header(ACCEPT, "*/*"))
            .await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ArchiveError::RequestError))
            .boxed())
    }
}

/// Extract and deserialize the `data` member of a JSON response envelope.
pub(crate) fn parse_data<T: DeserializeOwned>(text: &str) -> Result<T> {
    let mut response: Value = serde_json::from_str(text)?;
    let data = response
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| ArchiveError::InvalidResponse("missing data member".to_string()))?;
    Ok(serde_json::from_value(data)?)
}

/// Strip trailing slashes so equivalent host URLs compare equal.
pub(crate) fn normalize_host(mut host: String) -> String {
    while host.ends_with('/') {
        host.pop();
    }
    host
}

//! Providers that obtain a fresh token from the control plane on every call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::TokenProvider;
use crate::api::client::parse_data;
use crate::api::Connection;
use crate::error::{ArchiveError, Result};

const V3_TOKEN_URI: &str = "/c42api/v3/auth/jwt";
const V3_COOKIE_NAME: &str = "C42_JWT_API_TOKEN";
const V1_TOKEN_URI: &str = "/api/AuthToken";
const SERVER_ENV_URI: &str = "/api/ServerEnv";

#[derive(Debug, Deserialize)]
struct V3TokenData {
    v3_user_token: String,
}

/// JWT provider bound to an authenticated control-plane connection.
///
/// No caching: each secret request hits the token endpoint.
#[derive(Debug, Clone)]
pub struct ApiV3TokenProvider {
    connection: Arc<Connection>,
}

impl ApiV3TokenProvider {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    async fn fetch_token(&self) -> Result<String> {
        let text = self
            .connection
            .get(V3_TOKEN_URI, &[("useBody", "true".to_string())])
            .await?;

        if !text.trim().is_empty() {
            let data: V3TokenData = parse_data(&text)?;
            return Ok(data.v3_user_token);
        }

        // Some server versions only deliver the token as a cookie.
        warn!("jwt response body was empty, reading token from cookie");
        self.connection.cookie(V3_COOKIE_NAME).ok_or_else(|| {
            ArchiveError::InvalidResponse(format!(
                "no token in response body or {} cookie",
                V3_COOKIE_NAME
            ))
        })
    }
}

#[async_trait]
impl TokenProvider for ApiV3TokenProvider {
    async fn get_target_host_address(&self) -> Result<String> {
        Ok(self.connection.host_address().to_string())
    }

    async fn get_secret_value(&self, _force_refresh: bool) -> Result<String> {
        self.fetch_token().await.map_err(|e| {
            ArchiveError::authentication(
                "An error occurred while trying to retrieve a jwt token",
                e,
            )
        })
    }
}

/// Provider for the legacy `id-token` auth scheme.
#[derive(Debug, Clone)]
pub struct ApiV1TokenProvider {
    connection: Arc<Connection>,
}

impl ApiV1TokenProvider {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    async fn fetch_token(&self) -> Result<String> {
        let text = self.connection.post::<Value>(V1_TOKEN_URI, None).await?;
        let parts: Vec<Value> = parse_data(&text)?;
        match parts.as_slice() {
            [id, token] => Ok(format!("{}-{}", value_text(id), value_text(token))),
            _ => Err(ArchiveError::InvalidResponse(format!(
                "expected [id, token], got {} elements",
                parts.len()
            ))),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TokenProvider for ApiV1TokenProvider {
    async fn get_target_host_address(&self) -> Result<String> {
        Ok(self.connection.host_address().to_string())
    }

    async fn get_secret_value(&self, _force_refresh: bool) -> Result<String> {
        self.fetch_token().await.map_err(|e| {
            ArchiveError::authentication(
                "An error occurred while trying to retrieve a V1 auth token",
                e,
            )
        })
    }
}

#[derive(Debug, Deserialize)]
struct ServerEnv {
    #[serde(rename = "stsBaseUrl")]
    sts_base_url: Option<String>,
}

/// JWT provider for the file event search service.
///
/// The token comes from the control plane like [`ApiV3TokenProvider`], but
/// the target host is derived from the STS base URL the server environment
/// reports, with `sts` replaced by `forensicsearch`.
#[derive(Debug, Clone)]
pub struct FileEventLoginProvider {
    inner: ApiV3TokenProvider,
}

impl FileEventLoginProvider {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            inner: ApiV3TokenProvider::new(connection),
        }
    }
}

#[async_trait]
impl TokenProvider for FileEventLoginProvider {
    async fn get_target_host_address(&self) -> Result<String> {
        let text = self
            .inner
            .connection
            .get(SERVER_ENV_URI, &[])
            .await
            .map_err(|e| {
                ArchiveError::authentication(
                    "An error occurred while requesting server environment information",
                    e,
                )
            })?;

        let env: ServerEnv = if text.trim().is_empty() {
            ServerEnv { sts_base_url: None }
        } else {
            serde_json::from_str(&text).map_err(|e| {
                ArchiveError::authentication(
                    "An error occurred while reading server environment information",
                    e.into(),
                )
            })?
        };

        let sts_base_url = env.sts_base_url.filter(|url| !url.is_empty()).ok_or_else(|| {
            ArchiveError::authentication(
                "Cannot determine file event service host address",
                ArchiveError::InvalidResponse("stsBaseUrl not found".to_string()),
            )
        })?;

        if !sts_base_url.contains("sts") {
            return Err(ArchiveError::authentication(
                "Cannot determine file event service host address",
                ArchiveError::InvalidResponse(format!(
                    "stsBaseUrl {} does not contain sts",
                    sts_base_url
                )),
            ));
        }

        let host = sts_base_url.replace("sts", "forensicsearch");
        debug!(%host, "resolved file event host");
        Ok(host)
    }

    async fn get_secret_value(&self, force_refresh: bool) -> Result<String> {
        self.inner.get_secret_value(force_refresh).await
    }
}

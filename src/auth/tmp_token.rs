//! Temporary login tokens for storage nodes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use super::TokenProvider;
use crate::api::Connection;
use crate::error::{ArchiveError, Result};

const LOGIN_TOKEN_URI: &str = "/api/LoginToken";
const STORAGE_AUTH_TOKEN_URI: &str = "/api/StorageAuthToken";

/// Storage node address and the temporary token that opens it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInfo {
    pub server_url: String,
    pub login_token: String,
}

/// Endpoint that exchanges control-plane credentials for a [`LoginInfo`].
#[async_trait]
pub trait TmpAuthSource: Send + Sync {
    /// Name of the token kind, used in error messages.
    fn token_kind(&self) -> &'static str;

    async fn fetch_login_info(&self) -> Result<LoginInfo>;
}

/// Caches the login info a [`TmpAuthSource`] issues.
///
/// The cache is filled lazily and replaced on `force_refresh`. Fetches on one
/// instance are serialized so concurrent callers never overwrite each other's
/// result mid-flight.
pub struct TmpAuthTokenProvider<S> {
    source: S,
    cached: Mutex<Option<LoginInfo>>,
}

/// Login token for one device and destination.
pub type LoginTokenProvider = TmpAuthTokenProvider<LoginTokenSource>;

/// Storage auth token for one plan and destination.
pub type StorageAuthTokenProvider = TmpAuthTokenProvider<StorageAuthTokenSource>;

impl<S: TmpAuthSource> TmpAuthTokenProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    /// Fetch fresh login info and replace the cache.
    pub async fn get_login_info(&self) -> Result<LoginInfo> {
        let mut cached = self.cached.lock().await;
        let info = self.fetch().await?;
        *cached = Some(info.clone());
        Ok(info)
    }

    async fn fetch(&self) -> Result<LoginInfo> {
        debug!(kind = self.source.token_kind(), "requesting temporary auth token");
        self.source.fetch_login_info().await.map_err(|e| {
            ArchiveError::authentication(
                format!(
                    "An error occurred while requesting a {}",
                    self.source.token_kind()
                ),
                e,
            )
        })
    }

    async fn login_info(&self, force_refresh: bool) -> Result<LoginInfo> {
        let mut cached = self.cached.lock().await;
        match cached.as_ref() {
            Some(info) if !force_refresh => Ok(info.clone()),
            _ => {
                let info = self.fetch().await?;
                *cached = Some(info.clone());
                Ok(info)
            }
        }
    }
}

#[async_trait]
impl<S: TmpAuthSource> TokenProvider for TmpAuthTokenProvider<S> {
    async fn get_target_host_address(&self) -> Result<String> {
        Ok(self.login_info(false).await?.server_url)
    }

    async fn get_secret_value(&self, force_refresh: bool) -> Result<String> {
        Ok(self.login_info(force_refresh).await?.login_token)
    }
}

/// Exchanges `{userId, sourceGuid, destinationGuid}` for a login token.
pub struct LoginTokenSource {
    connection: Arc<Connection>,
    user_id: String,
    device_guid: String,
    destination_guid: String,
}

impl LoginTokenSource {
    pub fn new(
        connection: Arc<Connection>,
        user_id: impl Into<String>,
        device_guid: impl Into<String>,
        destination_guid: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            user_id: user_id.into(),
            device_guid: device_guid.into(),
            destination_guid: destination_guid.into(),
        }
    }
}

#[async_trait]
impl TmpAuthSource for LoginTokenSource {
    fn token_kind(&self) -> &'static str {
        "LoginToken"
    }

    async fn fetch_login_info(&self) -> Result<LoginInfo> {
        let body = json!({
            "userId": self.user_id,
            "sourceGuid": self.device_guid,
            "destinationGuid": self.destination_guid,
        });
        self.connection.post_data(LOGIN_TOKEN_URI, &body).await
    }
}

/// Exchanges `{planUid, destinationGuid}` for a storage auth token.
pub struct StorageAuthTokenSource {
    connection: Arc<Connection>,
    plan_uid: String,
    destination_guid: String,
}

impl StorageAuthTokenSource {
    pub fn new(
        connection: Arc<Connection>,
        plan_uid: impl Into<String>,
        destination_guid: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            plan_uid: plan_uid.into(),
            destination_guid: destination_guid.into(),
        }
    }
}

#[async_trait]
impl TmpAuthSource for StorageAuthTokenSource {
    fn token_kind(&self) -> &'static str {
        "StorageAuthToken"
    }

    async fn fetch_login_info(&self) -> Result<LoginInfo> {
        let body = json!({
            "planUid": self.plan_uid,
            "destinationGuid": self.destination_guid,
        });
        self.connection.post_data(STORAGE_AUTH_TOKEN_URI, &body).await
    }
}

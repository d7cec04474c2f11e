//! Creation of authenticated connections.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::api::Connection;
use crate::auth::{AuthScheme, TokenProvider};
use crate::config::SdkConfig;
use crate::error::{ArchiveError, Result};
use crate::http::HttpClient;

/// Builds the connection a storage session manager caches.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Create a connection to `host_address` authenticated by `provider`.
    async fn create_storage_session(
        &self,
        host_address: &str,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Arc<Connection>>;
}

/// Session factory backed by real HTTP clients.
///
/// Every connection gets its own client (and cookie jar) configured from the
/// shared [`SdkConfig`].
#[derive(Debug, Clone, Default)]
pub struct HttpSessionFactory {
    config: SdkConfig,
}

impl HttpSessionFactory {
    pub fn new(config: SdkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Unauthenticated connection, used before any credential is known.
    pub fn create_anonymous_session(&self, host_address: &str) -> Result<Arc<Connection>> {
        Ok(Arc::new(Connection::new(
            host_address,
            HttpClient::from_config(&self.config)?,
        )))
    }

    pub async fn create_basic_auth_session(
        &self,
        host_address: &str,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Arc<Connection>> {
        self.create(host_address, provider, AuthScheme::Basic).await
    }

    pub async fn create_jwt_session(
        &self,
        host_address: &str,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Arc<Connection>> {
        self.create(host_address, provider, AuthScheme::V3UserToken)
            .await
    }

    pub async fn create_v1_session(
        &self,
        host_address: &str,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Arc<Connection>> {
        self.create(host_address, provider, AuthScheme::V1Token).await
    }

    async fn create(
        &self,
        host_address: &str,
        provider: Arc<dyn TokenProvider>,
        scheme: AuthScheme,
    ) -> Result<Arc<Connection>> {
        let result = async {
            let http = HttpClient::from_config(&self.config)?;
            Connection::authenticated(host_address, http, provider, scheme).await
        }
        .await;

        match result {
            Ok(connection) => {
                info!(host = host_address, scheme = scheme.prefix(), "session created");
                Ok(Arc::new(connection))
            }
            Err(e) => Err(ArchiveError::SessionInitialization {
                host: host_address.to_string(),
                source: Box::new(e),
            }),
        }
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn create_storage_session(
        &self,
        host_address: &str,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Arc<Connection>> {
        self.create(host_address, provider, AuthScheme::LoginToken)
            .await
    }
}

//! Top-level client wiring.

use std::sync::Arc;

use tracing::info;

use crate::api::Connection;
use crate::archive::{ArchiveAccessorManager, ArchiveModule, PollOptions};
use crate::auth::{ApiV3TokenProvider, BasicAuthProvider, FileEventLoginProvider, TokenProvider};
use crate::clients::{ArchiveClient, KeyValueStoreClient};
use crate::config::SdkConfig;
use crate::error::Result;
use crate::session::{HttpSessionFactory, StorageSessionManager};
use crate::storage::StorageClientFactory;

/// Authenticated client of one control-plane host.
///
/// ```no_run
/// # async fn example() -> archivelib::Result<()> {
/// use archivelib::{RestoreOptions, Sdk};
///
/// let sdk = Sdk::from_local_account("https://console.example.com", "admin", "secret").await?;
/// let bytes = sdk
///     .archive()
///     .stream_from_backup(["C:/Users/me/a.txt", "C:/Users/me/b.txt"], "device-guid", &RestoreOptions::default())
///     .await?
///     .collect_bytes()
///     .await?;
/// println!("restored {} bytes (zip)", bytes.len());
/// # Ok(())
/// # }
/// ```
pub struct Sdk {
    session_factory: HttpSessionFactory,
    auth_connection: Arc<Connection>,
    connection: Arc<Connection>,
    token_provider: Arc<ApiV3TokenProvider>,
    storage: Arc<StorageClientFactory>,
    archive: ArchiveModule,
}

impl Sdk {
    /// Log in with a local account using the default configuration.
    pub async fn from_local_account(
        host_address: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        Self::from_local_account_with_config(
            host_address,
            username,
            password,
            SdkConfig::default(),
        )
        .await
    }

    /// Log in with a local account.
    ///
    /// Basic credentials are only used to obtain JWTs; every other request
    /// carries a `v3_user_token` header.
    pub async fn from_local_account_with_config(
        host_address: &str,
        username: &str,
        password: &str,
        config: SdkConfig,
    ) -> Result<Self> {
        let poll = PollOptions::from_config(&config);
        let session_factory = HttpSessionFactory::new(config);

        let basic = Arc::new(BasicAuthProvider::new(host_address, username, password));
        let auth_connection = session_factory
            .create_basic_auth_session(host_address, basic)
            .await?;
        let token_provider = Arc::new(ApiV3TokenProvider::new(auth_connection.clone()));
        let connection = session_factory
            .create_jwt_session(host_address, token_provider.clone())
            .await?;

        let session_manager = Arc::new(StorageSessionManager::new(Arc::new(
            session_factory.clone(),
        )));
        let storage = Arc::new(StorageClientFactory::new(
            connection.clone(),
            session_manager,
        ));
        let accessor_manager = ArchiveAccessorManager::new(
            Arc::new(ArchiveClient::new(connection.clone())),
            storage.clone(),
        )
        .with_poll_options(poll);

        info!(host = host_address, "logged in");
        Ok(Self {
            session_factory,
            auth_connection,
            connection,
            token_provider,
            storage,
            archive: ArchiveModule::new(Arc::new(accessor_manager)),
        })
    }

    pub fn archive(&self) -> &ArchiveModule {
        &self.archive
    }

    pub fn storage(&self) -> &Arc<StorageClientFactory> {
        &self.storage
    }

    /// JWT-authenticated control-plane connection.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn config(&self) -> &SdkConfig {
        self.session_factory.config()
    }

    /// Key-value store client for `host_address`, authenticated with the
    /// control-plane JWT.
    pub async fn key_value_store(&self, host_address: &str) -> Result<KeyValueStoreClient> {
        let connection = self
            .session_factory
            .create_jwt_session(host_address, self.token_provider.clone())
            .await?;
        Ok(KeyValueStoreClient::new(connection))
    }

    /// Connection to the file event service of this environment.
    pub async fn file_event_connection(&self) -> Result<Arc<Connection>> {
        let provider = Arc::new(FileEventLoginProvider::new(self.auth_connection.clone()));
        let host = provider.get_target_host_address().await?;
        self.session_factory.create_jwt_session(&host, provider).await
    }
}

impl std::fmt::Debug for Sdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdk")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

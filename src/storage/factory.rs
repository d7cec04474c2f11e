//! Lookup of the storage node that holds a device's archive.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::archive::{HttpStorageArchiveClient, StorageArchiveClient};
use crate::api::Connection;
use crate::auth::{
    LoginTokenProvider, LoginTokenSource, StorageAuthTokenProvider, StorageAuthTokenSource,
    TokenProvider,
};
use crate::error::{ArchiveError, Result};
use crate::session::StorageSessionManager;

const COMPUTER_URI: &str = "/api/Computer";

/// User id the control plane resolves to the authenticated user.
const CURRENT_USER_ID: &str = "my";

/// Client bound to the storage node serving one archive.
#[derive(Clone)]
pub struct StorageClient {
    connection: Option<Arc<Connection>>,
    archive: Arc<dyn StorageArchiveClient>,
}

impl StorageClient {
    /// Client whose archive requests go through `connection`.
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            archive: Arc::new(HttpStorageArchiveClient::new(connection.clone())),
            connection: Some(connection),
        }
    }

    /// Client over any archive implementation, with no HTTP connection attached.
    pub fn from_archive(archive: Arc<dyn StorageArchiveClient>) -> Self {
        Self {
            connection: None,
            archive,
        }
    }

    pub fn archive(&self) -> Arc<dyn StorageArchiveClient> {
        self.archive.clone()
    }

    pub fn connection(&self) -> Option<&Arc<Connection>> {
        self.connection.as_ref()
    }
}

/// Anything that can produce a storage client for a device.
#[async_trait]
pub trait StorageClientSource: Send + Sync {
    async fn from_device_guid(
        &self,
        device_guid: &str,
        destination_guid: Option<&str>,
    ) -> Result<StorageClient>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupUsage {
    target_computer_guid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Computer {
    #[serde(default)]
    backup_usage: Vec<BackupUsage>,
}

/// Resolves storage nodes through the control plane and reuses their sessions.
pub struct StorageClientFactory {
    connection: Arc<Connection>,
    session_manager: Arc<StorageSessionManager>,
}

impl StorageClientFactory {
    /// `connection` must be authenticated against the control plane.
    pub fn new(connection: Arc<Connection>, session_manager: Arc<StorageSessionManager>) -> Self {
        Self {
            connection,
            session_manager,
        }
    }

    pub fn session_manager(&self) -> &Arc<StorageSessionManager> {
        &self.session_manager
    }

    /// Storage client for the node that holds `plan_uid` at `destination_guid`.
    pub async fn from_plan_info(
        &self,
        plan_uid: &str,
        destination_guid: &str,
    ) -> Result<StorageClient> {
        let provider: Arc<dyn TokenProvider> = Arc::new(StorageAuthTokenProvider::new(
            StorageAuthTokenSource::new(self.connection.clone(), plan_uid, destination_guid),
        ));
        let session = self.session_manager.get_storage_session(provider).await?;
        Ok(StorageClient::new(session))
    }

    /// First backup destination the control plane reports for a device.
    async fn get_destination_guid(&self, device_guid: &str) -> Result<String> {
        let uri = format!("{}/{}", COMPUTER_URI, device_guid);
        let query = [
            ("idType", "guid".to_string()),
            ("incBackupUsage", "true".to_string()),
        ];
        let computer: Computer = self.connection.get_data(&uri, &query).await?;
        computer
            .backup_usage
            .into_iter()
            .next()
            .map(|usage| usage.target_computer_guid)
            .ok_or_else(|| ArchiveError::NoDestination {
                device_guid: device_guid.to_string(),
            })
    }
}

#[async_trait]
impl StorageClientSource for StorageClientFactory {
    async fn from_device_guid(
        &self,
        device_guid: &str,
        destination_guid: Option<&str>,
    ) -> Result<StorageClient> {
        let destination_guid = match destination_guid {
            Some(guid) => guid.to_string(),
            None => self.get_destination_guid(device_guid).await?,
        };
        debug!(device_guid, %destination_guid, "resolving storage node");

        let provider: Arc<dyn TokenProvider> = Arc::new(LoginTokenProvider::new(
            LoginTokenSource::new(
                self.connection.clone(),
                CURRENT_USER_ID,
                device_guid,
                destination_guid,
            ),
        ));
        let session = self.session_manager.get_storage_session(provider).await?;
        Ok(StorageClient::new(session))
    }
}

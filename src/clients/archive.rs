use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::api::Connection;
use crate::error::Result;

const DATA_KEY_TOKEN_URI: &str = "/api/DataKeyToken";

/// Control-plane archive operations needed to open a restore session.
#[async_trait]
pub trait ArchiveService: Send + Sync {
    /// Server-issued token that lets a storage node decrypt a device's archive.
    async fn get_data_key_token(&self, device_guid: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataKeyToken {
    data_key_token: String,
}

#[derive(Debug, Clone)]
pub struct ArchiveClient {
    connection: Arc<Connection>,
}

impl ArchiveClient {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ArchiveService for ArchiveClient {
    async fn get_data_key_token(&self, device_guid: &str) -> Result<String> {
        let token: DataKeyToken = self
            .connection
            .post_data(DATA_KEY_TOKEN_URI, &json!({"computerGuid": device_guid}))
            .await?;
        Ok(token.data_key_token)
    }
}

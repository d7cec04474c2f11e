//! Archive endpoints of a storage node.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::Connection;
use crate::archive::{FileNode, FileSizeInfo, PathSet};
use crate::error::Result;
use crate::http::ByteStream;

const RESTORE_SESSION_URI: &str = "/api/WebRestoreSession";
const TREE_NODE_URI: &str = "/api/WebRestoreTreeNode";
const FILE_SIZE_URI: &str = "/api/WebRestoreFileSize";
const RESTORE_JOB_URI: &str = "/api/WebRestoreJob";
const RESTORE_JOB_RESULT_URI: &str = "/api/WebRestoreJobResult";

/// Keys that unlock a device's archive for a restore session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionKeys {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_key_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSession {
    pub web_restore_session_id: String,
}

/// Body of a restore-job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub guid: String,
    pub web_restore_session_id: String,
    pub path_set: Vec<PathSet>,
    pub num_files: u64,
    pub num_dirs: u64,
    pub size: u64,
    /// `None` is sent as null, leaving the server default (no archive).
    pub zip_result: Option<bool>,
    pub show_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreJobStarted {
    pub job_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RestoreStatus {
    pub done: bool,
}

/// Archive browsing and restore operations on a storage node.
#[async_trait]
pub trait StorageArchiveClient: Send + Sync {
    async fn create_restore_session(
        &self,
        device_guid: &str,
        keys: &DecryptionKeys,
    ) -> Result<RestoreSession>;

    /// List the children of `file_id`, or the roots when `file_id` is `None`.
    async fn get_file_path_metadata(
        &self,
        session_id: &str,
        device_guid: &str,
        file_id: Option<&str>,
        show_deleted: bool,
    ) -> Result<Vec<FileNode>>;

    async fn get_file_size(&self, device_guid: &str, file_id: &str) -> Result<FileSizeInfo>;

    async fn start_restore(&self, request: &RestoreRequest) -> Result<RestoreJobStarted>;

    async fn get_restore_status(&self, job_id: &str) -> Result<RestoreStatus>;

    async fn cancel_restore(&self, job_id: &str) -> Result<()>;

    async fn stream_restore_result(&self, job_id: &str) -> Result<ByteStream>;
}

/// [`StorageArchiveClient`] over a storage-node connection.
#[derive(Debug, Clone)]
pub struct HttpStorageArchiveClient {
    connection: Arc<Connection>,
}

impl HttpStorageArchiveClient {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl StorageArchiveClient for HttpStorageArchiveClient {
    async fn create_restore_session(
        &self,
        device_guid: &str,
        keys: &DecryptionKeys,
    ) -> Result<RestoreSession> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            computer_guid: &'a str,
            #[serde(flatten)]
            keys: &'a DecryptionKeys,
        }

        self.connection
            .post_data(
                RESTORE_SESSION_URI,
                &Body {
                    computer_guid: device_guid,
                    keys,
                },
            )
            .await
    }

    async fn get_file_path_metadata(
        &self,
        session_id: &str,
        device_guid: &str,
        file_id: Option<&str>,
        show_deleted: bool,
    ) -> Result<Vec<FileNode>> {
        let mut query = vec![
            ("guid", device_guid.to_string()),
            ("webRestoreSessionId", session_id.to_string()),
            ("showDeleted", show_deleted.to_string()),
        ];
        if let Some(file_id) = file_id {
            query.push(("fileId", file_id.to_string()));
        }
        self.connection.get_data(TREE_NODE_URI, &query).await
    }

    async fn get_file_size(&self, device_guid: &str, file_id: &str) -> Result<FileSizeInfo> {
        let query = [
            ("guid", device_guid.to_string()),
            ("fileId", file_id.to_string()),
        ];
        self.connection.get_data(FILE_SIZE_URI, &query).await
    }

    async fn start_restore(&self, request: &RestoreRequest) -> Result<RestoreJobStarted> {
        self.connection.post_data(RESTORE_JOB_URI, request).await
    }

    async fn get_restore_status(&self, job_id: &str) -> Result<RestoreStatus> {
        let uri = format!("{}/{}", RESTORE_JOB_URI, job_id);
        self.connection.get_data(&uri, &[]).await
    }

    async fn cancel_restore(&self, job_id: &str) -> Result<()> {
        let uri = format!("{}/{}", RESTORE_JOB_URI, job_id);
        self.connection.delete(&uri).await
    }

    async fn stream_restore_result(&self, job_id: &str) -> Result<ByteStream> {
        let uri = format!("{}/{}", RESTORE_JOB_RESULT_URI, job_id);
        self.connection.get_stream(&uri).await
    }
}

//! In-memory storage node for archive tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};

use super::node::{FileNode, FileSizeInfo, FileType};
use crate::error::{ArchiveError, Result};
use crate::http::ByteStream;
use crate::storage::{
    DecryptionKeys, RestoreJobStarted, RestoreRequest, RestoreSession, RestoreStatus,
    StorageArchiveClient,
};

pub(crate) fn node(id: &str, path: &str, file_type: FileType) -> FileNode {
    FileNode {
        id: id.to_string(),
        path: path.to_string(),
        file_type,
    }
}

#[derive(Default)]
pub(crate) struct FakeArchive {
    /// Children by parent id; `None` holds the roots.
    tree: HashMap<Option<String>, Vec<FileNode>>,
    sizes: HashMap<String, FileSizeInfo>,
    statuses: Mutex<VecDeque<Result<bool>>>,
    pub result: Vec<u8>,
    pub sessions: Mutex<Vec<(String, DecryptionKeys)>>,
    pub listings: Mutex<Vec<(String, Option<String>)>>,
    pub requests: Mutex<Vec<RestoreRequest>>,
    pub cancelled: Mutex<Vec<String>>,
    pub size_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self {
            result: b"restored".to_vec(),
            ..Default::default()
        }
    }

    pub fn with_children(mut self, parent: Option<&str>, children: Vec<FileNode>) -> Self {
        self.tree.insert(parent.map(str::to_string), children);
        self
    }

    pub fn with_size(mut self, id: &str, num_files: u64, num_dirs: u64, size: u64) -> Self {
        self.sizes.insert(
            id.to_string(),
            FileSizeInfo {
                num_files,
                num_dirs,
                size,
            },
        );
        self
    }

    /// Status answers in order; once exhausted every job reports done.
    pub fn with_statuses(self, statuses: Vec<Result<bool>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn last_request(&self) -> RestoreRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl StorageArchiveClient for FakeArchive {
    async fn create_restore_session(
        &self,
        device_guid: &str,
        keys: &DecryptionKeys,
    ) -> Result<RestoreSession> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.push((device_guid.to_string(), keys.clone()));
        Ok(RestoreSession {
            web_restore_session_id: format!("ws-{}", sessions.len()),
        })
    }

    async fn get_file_path_metadata(
        &self,
        session_id: &str,
        _device_guid: &str,
        file_id: Option<&str>,
        _show_deleted: bool,
    ) -> Result<Vec<FileNode>> {
        self.listings
            .lock()
            .unwrap()
            .push((session_id.to_string(), file_id.map(str::to_string)));
        Ok(self
            .tree
            .get(&file_id.map(str::to_string))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_file_size(&self, _device_guid: &str, file_id: &str) -> Result<FileSizeInfo> {
        self.size_calls.fetch_add(1, Ordering::SeqCst);
        self.sizes
            .get(file_id)
            .copied()
            .ok_or_else(|| ArchiveError::NotFound {
                body: file_id.to_string(),
            })
    }

    async fn start_restore(&self, request: &RestoreRequest) -> Result<RestoreJobStarted> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(RestoreJobStarted {
            job_id: format!("job-{}", requests.len()),
        })
    }

    async fn get_restore_status(&self, _job_id: &str) -> Result<RestoreStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let done = self.statuses.lock().unwrap().pop_front().unwrap_or(Ok(true))?;
        Ok(RestoreStatus { done })
    }

    async fn cancel_restore(&self, job_id: &str) -> Result<()> {
        self.cancelled.lock().unwrap().push(job_id.to_string());
        Ok(())
    }

    async fn stream_restore_result(&self, _job_id: &str) -> Result<ByteStream> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let chunk: Result<Bytes> = Ok(Bytes::from(self.result.clone()));
        Ok(stream::iter(vec![chunk]).boxed())
    }
}

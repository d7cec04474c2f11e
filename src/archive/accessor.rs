//! Path resolution and restores within one restore session.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use super::node::{FileNode, FileSelection, FileSizeInfo};
use super::path::{normalize_separators, posix_join, FilePaths};
use super::restore::RestoreJobManager;
use super::stream::RestoreStream;
use crate::error::{ArchiveError, Result};
use crate::storage::StorageArchiveClient;

/// Deleted files stay visible when browsing.
const SHOW_DELETED: bool = true;

/// Handle on one device's archive through an open restore session.
pub struct ArchiveAccessor {
    device_guid: String,
    session_id: String,
    archive: Arc<dyn StorageArchiveClient>,
    restore_job_manager: RestoreJobManager,
}

impl ArchiveAccessor {
    pub fn new(
        device_guid: impl Into<String>,
        session_id: impl Into<String>,
        archive: Arc<dyn StorageArchiveClient>,
        restore_job_manager: RestoreJobManager,
    ) -> Self {
        Self {
            device_guid: device_guid.into(),
            session_id: session_id.into(),
            archive,
            restore_job_manager,
        }
    }

    pub fn device_guid(&self) -> &str {
        &self.device_guid
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn restore_job_manager(&self) -> &RestoreJobManager {
        &self.restore_job_manager
    }

    /// Restore `paths` as a single job and stream the result.
    ///
    /// Paths are matched case-insensitively and may use either separator.
    /// With `ignore_size_calc` set, the per-path size lookup is skipped and
    /// every selection counts as one file, one directory and one byte.
    pub async fn stream_from_backup(
        &self,
        paths: impl Into<FilePaths>,
        ignore_size_calc: bool,
    ) -> Result<RestoreStream> {
        let paths = paths.into();
        let selections = self.create_file_selections(&paths, ignore_size_calc).await?;
        self.restore_job_manager.get_stream(&selections).await
    }

    /// Locate `path` in the archive tree.
    ///
    /// The first segment names a root; every following segment one level
    /// below it. An empty segment ends the walk, so `"C:/Users/"` resolves to
    /// `Users`.
    pub async fn resolve_path(&self, path: &str) -> Result<FileNode> {
        let path = normalize_separators(path);
        let mut segments = path.split('/');

        let root_path = format!("{}/", segments.next().unwrap_or_default());
        let roots = self.list_children(None).await?;
        let mut current = match roots.iter().position(|n| n.path_matches(&root_path)) {
            Some(index) => roots[index].clone(),
            None => return Err(self.not_found(&path, roots)),
        };

        for segment in segments {
            if segment.is_empty() {
                break;
            }
            let target = posix_join(&current.path, segment);
            let mut children = self.list_children(Some(&current.id)).await?;
            current = match children.iter().position(|n| n.path_matches(&target)) {
                Some(index) => children.swap_remove(index),
                None => return Err(self.not_found(&target, children)),
            };
        }

        debug!(path = %path, id = %current.id, "resolved archive path");
        Ok(current)
    }

    /// Children of `node_id`, or the archive roots.
    pub async fn list_children(&self, node_id: Option<&str>) -> Result<Vec<FileNode>> {
        self.archive
            .get_file_path_metadata(&self.session_id, &self.device_guid, node_id, SHOW_DELETED)
            .await
    }

    pub async fn get_file_size(&self, node: &FileNode) -> Result<FileSizeInfo> {
        self.archive.get_file_size(&self.device_guid, &node.id).await
    }

    async fn create_file_selections(
        &self,
        paths: &FilePaths,
        ignore_size_calc: bool,
    ) -> Result<Vec<FileSelection>> {
        let mut nodes = Vec::with_capacity(paths.len());
        for path in paths.iter() {
            nodes.push(self.resolve_path(path).await?);
        }

        let sizes = if ignore_size_calc {
            vec![FileSizeInfo::placeholder(); nodes.len()]
        } else {
            try_join_all(nodes.iter().map(|node| self.get_file_size(node))).await?
        };

        Ok(nodes
            .iter()
            .zip(sizes)
            .map(|(node, size)| FileSelection::new(node, size))
            .collect())
    }

    fn not_found(&self, path: &str, listing: Vec<FileNode>) -> ArchiveError {
        ArchiveError::ArchiveFileNotFound {
            device_guid: self.device_guid.clone(),
            path: path.to_string(),
            listing,
        }
    }
}

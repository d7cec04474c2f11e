use std::sync::Arc;

use super::accessor::ArchiveAccessor;
use super::manager::{AccessorOptions, ArchiveAccessorManager};
use super::path::FilePaths;
use super::stream::RestoreStream;
use crate::error::Result;

/// Options for a one-shot restore.
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    pub destination_guid: Option<String>,
    pub archive_password: Option<String>,
    pub encryption_key: Option<String>,
    /// Skip per-path size lookups.
    pub ignore_size_calc: bool,
}

impl RestoreOptions {
    pub fn accessor_options(&self) -> AccessorOptions {
        AccessorOptions {
            destination_guid: self.destination_guid.clone(),
            private_password: self.archive_password.clone(),
            encryption_key: self.encryption_key.clone(),
        }
    }
}

/// Entry point for restoring files from device backups.
#[derive(Clone)]
pub struct ArchiveModule {
    accessor_manager: Arc<ArchiveAccessorManager>,
}

impl ArchiveModule {
    pub fn new(accessor_manager: Arc<ArchiveAccessorManager>) -> Self {
        Self { accessor_manager }
    }

    pub async fn get_archive_accessor(
        &self,
        device_guid: &str,
        options: &AccessorOptions,
    ) -> Result<ArchiveAccessor> {
        self.accessor_manager
            .get_archive_accessor(device_guid, options)
            .await
    }

    /// Open a restore session on `device_guid` and stream `paths` from it.
    ///
    /// ```no_run
    /// # async fn example(sdk: archivelib::Sdk) -> archivelib::Result<()> {
    /// use archivelib::RestoreOptions;
    ///
    /// let stream = sdk
    ///     .archive()
    ///     .stream_from_backup("C:/Users/me/notes.txt", "device-guid", &RestoreOptions::default())
    ///     .await?;
    /// let mut file = tokio::fs::File::create("notes.txt").await?;
    /// stream.write_to(&mut file).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn stream_from_backup(
        &self,
        paths: impl Into<FilePaths>,
        device_guid: &str,
        options: &RestoreOptions,
    ) -> Result<RestoreStream> {
        let accessor = self
            .get_archive_accessor(device_guid, &options.accessor_options())
            .await?;
        accessor
            .stream_from_backup(paths, options.ignore_size_calc)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::node::FileType;
    use crate::archive::testing::{node, FakeArchive};
    use crate::clients::ArchiveService;
    use crate::storage::{StorageClient, StorageClientSource};
    use async_trait::async_trait;

    struct Service;

    #[async_trait]
    impl ArchiveService for Service {
        async fn get_data_key_token(&self, _device_guid: &str) -> Result<String> {
            Ok("dkt".to_string())
        }
    }

    struct Storage(Arc<FakeArchive>);

    #[async_trait]
    impl StorageClientSource for Storage {
        async fn from_device_guid(&self, _: &str, _: Option<&str>) -> Result<StorageClient> {
            Ok(StorageClient::from_archive(self.0.clone()))
        }
    }

    fn module(archive: Arc<FakeArchive>) -> ArchiveModule {
        ArchiveModule::new(Arc::new(ArchiveAccessorManager::new(
            Arc::new(Service),
            Arc::new(Storage(archive)),
        )))
    }

    #[tokio::test]
    async fn test_stream_from_backup() {
        let archive = Arc::new(
            FakeArchive::new()
                .with_children(None, vec![node("r", "C:/", FileType::Directory)])
                .with_children(Some("r"), vec![node("f", "C:/notes.txt", FileType::File)])
                .with_size("f", 1, 0, 8),
        );
        let options = RestoreOptions {
            archive_password: Some("pw".to_string()),
            ..Default::default()
        };

        let data = module(archive.clone())
            .stream_from_backup("c:\\NOTES.txt", "device-1", &options)
            .await
            .unwrap()
            .collect_bytes()
            .await
            .unwrap();

        assert_eq!(data, b"restored");
        let (device, keys) = archive.sessions.lock().unwrap()[0].clone();
        assert_eq!(device, "device-1");
        assert_eq!(keys.private_password.as_deref(), Some("pw"));
        assert_eq!(archive.last_request().size, 8);
    }

    #[tokio::test]
    async fn test_each_call_opens_a_new_session() {
        let archive = Arc::new(
            FakeArchive::new()
                .with_children(None, vec![node("r", "C:/", FileType::Directory)])
                .with_size("r", 0, 1, 0),
        );
        let module = module(archive.clone());

        for _ in 0..2 {
            module
                .stream_from_backup("C:", "device-1", &RestoreOptions::default())
                .await
                .unwrap();
        }

        assert_eq!(archive.sessions.lock().unwrap().len(), 2);
        let requests = archive.requests.lock().unwrap();
        assert_eq!(requests[0].web_restore_session_id, "ws-1");
        assert_eq!(requests[1].web_restore_session_id, "ws-2");
    }
}

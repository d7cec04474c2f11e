//! Opening restore sessions on a device's archive.

use std::sync::Arc;

use tracing::info;

use super::accessor::ArchiveAccessor;
use super::restore::{PollOptions, RestoreJobManager};
use crate::clients::ArchiveService;
use crate::error::Result;
use crate::storage::{DecryptionKeys, StorageClientSource};

/// How to reach and unlock an archive.
#[derive(Debug, Clone, Default)]
pub struct AccessorOptions {
    /// Storage destination to use instead of the device's first one.
    pub destination_guid: Option<String>,
    /// Archive password for devices protected by one.
    pub private_password: Option<String>,
    /// Raw custom key; when set, neither a data key token nor the password
    /// is sent.
    pub encryption_key: Option<String>,
}

impl AccessorOptions {
    pub fn with_destination(mut self, destination_guid: impl Into<String>) -> Self {
        self.destination_guid = Some(destination_guid.into());
        self
    }

    pub fn with_private_password(mut self, password: impl Into<String>) -> Self {
        self.private_password = Some(password.into());
        self
    }

    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }
}

/// Creates [`ArchiveAccessor`]s.
pub struct ArchiveAccessorManager {
    archive_service: Arc<dyn ArchiveService>,
    storage: Arc<dyn StorageClientSource>,
    poll: PollOptions,
}

impl ArchiveAccessorManager {
    pub fn new(
        archive_service: Arc<dyn ArchiveService>,
        storage: Arc<dyn StorageClientSource>,
    ) -> Self {
        Self {
            archive_service,
            storage,
            poll: PollOptions::default(),
        }
    }

    /// Polling behaviour handed to every accessor's job manager.
    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    pub fn poll_options(&self) -> &PollOptions {
        &self.poll
    }

    /// Open a restore session on `device_guid`'s archive.
    pub async fn get_archive_accessor(
        &self,
        device_guid: &str,
        options: &AccessorOptions,
    ) -> Result<ArchiveAccessor> {
        let storage = self
            .storage
            .from_device_guid(device_guid, options.destination_guid.as_deref())
            .await?;
        let archive = storage.archive();

        let keys = self.decryption_keys(device_guid, options).await?;
        let session_id = archive
            .create_restore_session(device_guid, &keys)
            .await?
            .web_restore_session_id;
        info!(device_guid, %session_id, "restore session opened");

        let jobs = RestoreJobManager::new(
            archive.clone(),
            device_guid,
            session_id.clone(),
            self.poll.clone(),
        );
        Ok(ArchiveAccessor::new(device_guid, session_id, archive, jobs))
    }

    async fn decryption_keys(
        &self,
        device_guid: &str,
        options: &AccessorOptions,
    ) -> Result<DecryptionKeys> {
        if let Some(key) = non_empty(&options.encryption_key) {
            return Ok(DecryptionKeys {
                encryption_key: Some(key.to_string()),
                ..Default::default()
            });
        }

        let token = self.archive_service.get_data_key_token(device_guid).await?;
        Ok(DecryptionKeys {
            encryption_key: None,
            data_key_token: Some(token).filter(|t| !t.is_empty()),
            private_password: non_empty(&options.private_password).map(str::to_string),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testing::FakeArchive;
    use crate::error::ArchiveError;
    use crate::storage::StorageClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeService {
        token: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArchiveService for FakeService {
        async fn get_data_key_token(&self, _device_guid: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.token.clone())
        }
    }

    struct FakeStorage {
        archive: Arc<FakeArchive>,
        destinations: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl StorageClientSource for FakeStorage {
        async fn from_device_guid(
            &self,
            _device_guid: &str,
            destination_guid: Option<&str>,
        ) -> Result<StorageClient> {
            self.destinations
                .lock()
                .unwrap()
                .push(destination_guid.map(str::to_string));
            Ok(StorageClient::from_archive(self.archive.clone()))
        }
    }

    struct Fixture {
        service: Arc<FakeService>,
        storage: Arc<FakeStorage>,
        archive: Arc<FakeArchive>,
        manager: ArchiveAccessorManager,
    }

    fn fixture(token: &str) -> Fixture {
        let archive = Arc::new(FakeArchive::new());
        let service = Arc::new(FakeService {
            token: token.to_string(),
            calls: AtomicUsize::new(0),
        });
        let storage = Arc::new(FakeStorage {
            archive: archive.clone(),
            destinations: Mutex::new(Vec::new()),
        });
        let manager = ArchiveAccessorManager::new(service.clone(), storage.clone());
        Fixture {
            service,
            storage,
            archive,
            manager,
        }
    }

    fn sent_keys(archive: &FakeArchive) -> DecryptionKeys {
        archive.sessions.lock().unwrap().last().unwrap().1.clone()
    }

    #[tokio::test]
    async fn test_data_key_token_and_password() {
        let f = fixture("dkt");
        let options = AccessorOptions::default().with_private_password("secret");

        let accessor = f
            .manager
            .get_archive_accessor("device-1", &options)
            .await
            .unwrap();

        assert_eq!(accessor.device_guid(), "device-1");
        assert_eq!(accessor.session_id(), "ws-1");
        assert_eq!(
            sent_keys(&f.archive),
            DecryptionKeys {
                encryption_key: None,
                data_key_token: Some("dkt".to_string()),
                private_password: Some("secret".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_encryption_key_takes_precedence() {
        let f = fixture("dkt");
        let options = AccessorOptions::default()
            .with_private_password("secret")
            .with_encryption_key("raw-key");

        f.manager
            .get_archive_accessor("device-1", &options)
            .await
            .unwrap();

        assert_eq!(f.service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            sent_keys(&f.archive),
            DecryptionKeys {
                encryption_key: Some("raw-key".to_string()),
                data_key_token: None,
                private_password: None,
            }
        );
    }

    #[tokio::test]
    async fn test_empty_values_are_omitted() {
        let f = fixture("");
        let options = AccessorOptions::default()
            .with_private_password("")
            .with_encryption_key("");

        f.manager
            .get_archive_accessor("device-1", &options)
            .await
            .unwrap();

        assert_eq!(f.service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sent_keys(&f.archive), DecryptionKeys::default());
    }

    #[tokio::test]
    async fn test_destination_is_forwarded() {
        let f = fixture("dkt");

        f.manager
            .get_archive_accessor("device-1", &AccessorOptions::default())
            .await
            .unwrap();
        f.manager
            .get_archive_accessor("device-1", &AccessorOptions::default().with_destination("dest-2"))
            .await
            .unwrap();

        assert_eq!(
            *f.storage.destinations.lock().unwrap(),
            vec![None, Some("dest-2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        struct Unreachable;

        #[async_trait]
        impl StorageClientSource for Unreachable {
            async fn from_device_guid(&self, device_guid: &str, _: Option<&str>) -> Result<StorageClient> {
                Err(ArchiveError::NoDestination {
                    device_guid: device_guid.to_string(),
                })
            }
        }

        let f = fixture("dkt");
        let manager = ArchiveAccessorManager::new(f.service.clone(), Arc::new(Unreachable));

        let err = manager
            .get_archive_accessor("device-1", &AccessorOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ArchiveError::NoDestination { .. }));
        assert_eq!(f.service.calls.load(Ordering::SeqCst), 0);
    }
}

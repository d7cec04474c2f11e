//! Cache of storage-node connections keyed by host.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use super::factory::SessionFactory;
use crate::api::client::normalize_host;
use crate::api::Connection;
use crate::auth::TokenProvider;
use crate::error::Result;

/// Hands out one shared connection per resolved storage host.
///
/// The key is the host address the token provider resolves to, without
/// trailing slashes, so different
/// providers that point at the same host share a connection. Creation for a
/// given host is single-flight: concurrent callers wait for the first one and
/// receive the same `Arc`. A failed creation leaves nothing cached.
pub struct StorageSessionManager {
    factory: Arc<dyn SessionFactory>,
    sessions: DashMap<String, Arc<OnceCell<Arc<Connection>>>>,
}

impl StorageSessionManager {
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            sessions: DashMap::new(),
        }
    }

    /// Return the connection for the provider's host, creating it on first use.
    pub async fn get_storage_session(
        &self,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Arc<Connection>> {
        let url = normalize_host(provider.get_target_host_address().await?);
        if let Some(session) = self.get_saved_session_for_url(&url) {
            return Ok(session);
        }

        // Clone the cell out so the map shard is not locked across the await.
        let cell = self.sessions.entry(url.clone()).or_default().clone();
        let session = cell
            .get_or_try_init(|| async {
                debug!(%url, "creating storage session");
                self.factory.create_storage_session(&url, provider).await
            })
            .await?;
        Ok(session.clone())
    }

    /// Look up a previously created connection without creating one.
    ///
    /// Trailing slashes in `url` are ignored.
    pub fn get_saved_session_for_url(&self, url: &str) -> Option<Arc<Connection>> {
        self.sessions
            .get(&normalize_host(url.to_string()))
            .and_then(|cell| cell.get().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use crate::http::HttpClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Factory that counts creations and yields once so concurrent callers overlap.
    #[derive(Default)]
    struct CountingFactory {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SessionFactory for CountingFactory {
        async fn create_storage_session(
            &self,
            host_address: &str,
            _provider: Arc<dyn TokenProvider>,
        ) -> Result<Arc<Connection>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.fail {
                return Err(ArchiveError::SessionInitialization {
                    host: host_address.to_string(),
                    source: Box::new(ArchiveError::Custom("Mock error!".to_string())),
                });
            }
            Ok(Arc::new(Connection::new(
                host_address,
                HttpClient::new()?,
            )))
        }
    }

    /// Provider with a fixed host that counts secret fetches.
    struct StaticProvider {
        host: String,
        secret_calls: AtomicUsize,
    }

    impl StaticProvider {
        fn new(host: &str) -> Arc<Self> {
            Arc::new(Self {
                host: host.to_string(),
                secret_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TokenProvider for StaticProvider {
        async fn get_target_host_address(&self) -> Result<String> {
            Ok(self.host.clone())
        }

        async fn get_secret_value(&self, _force_refresh: bool) -> Result<String> {
            self.secret_calls.fetch_add(1, Ordering::SeqCst);
            Ok("secret".to_string())
        }
    }

    #[tokio::test]
    async fn test_get_storage_session_calls_factory() {
        let factory = Arc::new(CountingFactory::default());
        let manager = StorageSessionManager::new(factory.clone());

        manager
            .get_storage_session(StaticProvider::new("https://node-1"))
            .await
            .unwrap();
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_multiple_calls_return_same_session() {
        let factory = Arc::new(CountingFactory::default());
        let manager = StorageSessionManager::new(factory.clone());
        let provider = StaticProvider::new("https://node-1");

        let first = manager.get_storage_session(provider.clone()).await.unwrap();
        let second = manager.get_storage_session(provider.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.secret_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_distinct_providers_for_same_host_share_session() {
        let factory = Arc::new(CountingFactory::default());
        let manager = StorageSessionManager::new(factory.clone());

        let first = manager
            .get_storage_session(StaticProvider::new("https://node-1"))
            .await
            .unwrap();
        let second = manager
            .get_storage_session(StaticProvider::new("https://node-1"))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_trailing_slash_shares_session() {
        let factory = Arc::new(CountingFactory::default());
        let manager = StorageSessionManager::new(factory.clone());

        let first = manager
            .get_storage_session(StaticProvider::new("https://node-1"))
            .await
            .unwrap();
        let second = manager
            .get_storage_session(StaticProvider::new("https://node-1/"))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);

        let saved = manager
            .get_saved_session_for_url(first.host_address())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &saved));
        assert!(manager.get_saved_session_for_url("https://node-1//").is_some());
    }

    #[tokio::test]
    async fn test_session_found_by_its_host_address() {
        let manager = StorageSessionManager::new(Arc::new(CountingFactory::default()));

        let session = manager
            .get_storage_session(StaticProvider::new("https://node-1/"))
            .await
            .unwrap();
        assert_eq!(session.host_address(), "https://node-1");
        assert!(manager
            .get_saved_session_for_url(session.host_address())
            .is_some());
    }

    #[tokio::test]
    async fn test_different_hosts_get_different_sessions() {
        let factory = Arc::new(CountingFactory::default());
        let manager = StorageSessionManager::new(factory.clone());

        let first = manager
            .get_storage_session(StaticProvider::new("https://node-1"))
            .await
            .unwrap();
        let second = manager
            .get_storage_session(StaticProvider::new("https://node-2"))
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(factory.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_create_once() {
        let factory = Arc::new(CountingFactory::default());
        let manager = Arc::new(StorageSessionManager::new(factory.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager
                        .get_storage_session(StaticProvider::new("https://node-1"))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let sessions = futures::future::join_all(handles).await;
        let first = sessions[0].as_ref().unwrap();
        for session in &sessions {
            assert!(Arc::ptr_eq(first, session.as_ref().unwrap()));
        }
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_factory_error_propagates() {
        let factory = Arc::new(CountingFactory {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let manager = StorageSessionManager::new(factory.clone());

        let err = manager
            .get_storage_session(StaticProvider::new("https://node-1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Mock error!"));
        assert!(manager.get_saved_session_for_url("https://node-1").is_none());
    }

    #[test]
    fn test_saved_session_initially_none() {
        let manager = StorageSessionManager::new(Arc::new(CountingFactory::default()));
        assert!(manager.get_saved_session_for_url("TEST-URI").is_none());
    }

    #[tokio::test]
    async fn test_saved_session_after_successful_get() {
        let manager = StorageSessionManager::new(Arc::new(CountingFactory::default()));

        manager
            .get_storage_session(StaticProvider::new("TEST-URI"))
            .await
            .unwrap();
        assert!(manager.get_saved_session_for_url("TEST-URI").is_some());
    }
}

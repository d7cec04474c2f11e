use std::sync::Arc;

use crate::api::Connection;
use crate::error::Result;

/// Client for the key-value store that holds opaque configuration values.
#[derive(Debug, Clone)]
pub struct KeyValueStoreClient {
    connection: Arc<Connection>,
}

impl KeyValueStoreClient {
    pub fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    /// Raw stored value for `key`. The body is returned as-is, not parsed as JSON.
    pub async fn get_stored_value(&self, key: &str) -> Result<String> {
        self.connection.get_raw(&format!("/v1/{}", key)).await
    }
}

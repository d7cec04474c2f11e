use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};

use super::TokenProvider;
use crate::error::Result;

/// Username/password credentials for a fixed host.
///
/// The secret is computed once at construction and never refreshed.
#[derive(Clone)]
pub struct BasicAuthProvider {
    host_address: String,
    credentials: String,
}

impl BasicAuthProvider {
    pub fn new(host_address: impl Into<String>, username: &str, password: &str) -> Self {
        let credentials = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
        Self {
            host_address: host_address.into(),
            credentials,
        }
    }
}

impl std::fmt::Debug for BasicAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthProvider")
            .field("host_address", &self.host_address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for BasicAuthProvider {
    async fn get_target_host_address(&self) -> Result<String> {
        Ok(self.host_address.clone())
    }

    async fn get_secret_value(&self, _force_refresh: bool) -> Result<String> {
        Ok(self.credentials.clone())
    }
}

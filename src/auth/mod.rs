//! Token providers.
//!
//! A [`TokenProvider`] knows which host a session should talk to and how to
//! obtain the secret that authenticates it. There is one type per
//! authentication scheme; the temporary-token providers share their caching
//! through [`TmpAuthTokenProvider`] composed with a [`TmpAuthSource`].

mod api_token;
mod basic;
mod tmp_token;

use async_trait::async_trait;

use crate::error::Result;

pub use api_token::{ApiV1TokenProvider, ApiV3TokenProvider, FileEventLoginProvider};
pub use basic::BasicAuthProvider;
pub use tmp_token::{
    LoginInfo, LoginTokenProvider, LoginTokenSource, StorageAuthTokenProvider,
    StorageAuthTokenSource, TmpAuthSource, TmpAuthTokenProvider,
};

/// Source of a target host and the secret used to authenticate against it.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Base URL of the host the secret is valid for.
    async fn get_target_host_address(&self) -> Result<String>;

    /// Current secret. `force_refresh` asks caching providers to fetch a new one.
    async fn get_secret_value(&self, force_refresh: bool) -> Result<String>;
}

/// Prefix of the `Authorization` header for each kind of secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// base64 `username:password`
    Basic,
    /// JWT from the v3 auth endpoint
    V3UserToken,
    /// `id-token` pair from the v1 auth endpoint
    V1Token,
    /// Temporary login or storage-auth token for a storage node
    LoginToken,
}

impl AuthScheme {
    pub fn prefix(&self) -> &'static str {
        match self {
            AuthScheme::Basic => "Basic",
            AuthScheme::V3UserToken => "v3_user_token",
            AuthScheme::V1Token => "token",
            AuthScheme::LoginToken => "login_token",
        }
    }

    /// Full header value for `secret`.
    pub fn header_value(&self, secret: &str) -> String {
        format!("{} {}", self.prefix(), secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_values() {
        assert_eq!(AuthScheme::Basic.header_value("abc"), "Basic abc");
        assert_eq!(AuthScheme::V3UserToken.header_value("jwt"), "v3_user_token jwt");
        assert_eq!(AuthScheme::V1Token.header_value("1-2"), "token 1-2");
        assert_eq!(AuthScheme::LoginToken.header_value("t"), "login_token t");
    }
}

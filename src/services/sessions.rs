//! Token revocation store

use async_trait::async_trait;

use crate::error::AppResult;

/// Remembers logged-out tokens until they would have expired anyway
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Deny the token id for `ttl_seconds`
    async fn revoke(&self, jti: &str, ttl_seconds: u64) -> AppResult<()>;

    async fn is_revoked(&self, jti: &str) -> AppResult<bool>;
}

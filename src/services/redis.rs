//! Redis service for the logout denylist

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

use super::sessions::SessionStore;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(jti: &str) -> String {
        format!("revoked:{}", jti)
    }
}

#[async_trait]
impl SessionStore for RedisService {
    async fn revoke(&self, jti: &str, ttl_seconds: u64) -> AppResult<()> {
        // Already expired, nothing to deny
        if ttl_seconds == 0 {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(Self::key(jti), "1", ttl_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to revoke token in Redis: {}", e)))?;

        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        let exists: bool = conn
            .exists(Self::key(jti))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to check token in Redis: {}", e)))?;

        Ok(exists)
    }
}

use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Connection, Pool};

use crate::domain::repository::RateLimiter;
use crate::error::MagicLinkError;

/// Fixed-window counters on Redis, shared by every service instance. `INCR`
/// keeps increments atomic; the key expiry is the window.
#[derive(Clone)]
pub struct RedisRateLimiter {
    pub pool: Pool,
}

impl RedisRateLimiter {
    async fn conn(&self) -> Result<Connection, MagicLinkError> {
        self.pool
            .get()
            .await
            .map_err(|e| MagicLinkError::Internal(e.into()))
    }
}

impl RateLimiter for RedisRateLimiter {
    async fn too_many_attempts(
        &self,
        key: &str,
        max_attempts: u32,
    ) -> Result<bool, MagicLinkError> {
        let mut conn = self.conn().await?;
        let count: Option<u32> = conn
            .get(key)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| MagicLinkError::Internal(e.into()))?;
        Ok(count.unwrap_or(0) >= max_attempts)
    }

    async fn available_in(&self, key: &str) -> Result<u64, MagicLinkError> {
        let mut conn = self.conn().await?;
        let ttl: i64 = conn
            .ttl(key)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| MagicLinkError::Internal(e.into()))?;
        // -1 (no expiry) and -2 (missing key) both mean no active window.
        Ok(ttl.max(0) as u64)
    }

    async fn hit(&self, key: &str, window_secs: u64) -> Result<(), MagicLinkError> {
        let mut conn = self.conn().await?;
        let count: u32 = conn
            .incr(key, 1)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| MagicLinkError::Internal(e.into()))?;
        if count == 1 {
            // First hit after a reset starts the window.
            let _: i64 = conn
                .expire(key, window_secs as i64)
                .await
                .map_err(|e: deadpool_redis::redis::RedisError| {
                    MagicLinkError::Internal(e.into())
                })?;
        }
        Ok(())
    }

    async fn remaining_attempts(
        &self,
        key: &str,
        max_attempts: u32,
    ) -> Result<u32, MagicLinkError> {
        let mut conn = self.conn().await?;
        let count: Option<u32> = conn
            .get(key)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| MagicLinkError::Internal(e.into()))?;
        Ok(max_attempts.saturating_sub(count.unwrap_or(0)))
    }
}

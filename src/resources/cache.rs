//! Cache handle over a pooled Redis-protocol client.

use std::time::Duration;

use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, Runtime};

use crate::config::CacheConfig;
use crate::resources::ResourceError;

/// Acknowledgement expected from `PING`, compared case-insensitively.
pub const PING_ACK: &str = "pong";

/// Accept a `PING` reply only if it is the expected acknowledgement.
pub fn check_ping_reply(reply: &str) -> Result<(), ResourceError> {
    if reply.eq_ignore_ascii_case(PING_ACK) {
        Ok(())
    } else {
        Err(ResourceError::UnexpectedPing(reply.to_string()))
    }
}

/// Process-wide cache pool. Cloning shares the same pool.
#[derive(Clone)]
pub struct Cache {
    pool: Pool,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl Cache {
    /// Build the pool and require a `PONG` before handing it out.
    pub async fn connect(config: &CacheConfig) -> Result<Self, ResourceError> {
        let cache = Self::connect_lazy(config)?;
        let reply = cache.ping().await?;
        check_ping_reply(&reply)?;
        Ok(cache)
    }

    /// Build the pool without opening a connection.
    pub fn connect_lazy(config: &CacheConfig) -> Result<Self, ResourceError> {
        let pool = Config::from_url(config.url.clone())
            .builder()
            .map_err(|e| ResourceError::Cache(e.to_string()))?
            .max_size(config.pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| ResourceError::Cache(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<Connection, ResourceError> {
        self.pool
            .get()
            .await
            .map_err(|e| ResourceError::Cache(e.to_string()))
    }

    /// Send `PING` and return the raw reply.
    pub async fn ping(&self) -> Result<String, ResourceError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| ResourceError::Cache(e.to_string()))
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, ResourceError> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| ResourceError::Cache(e.to_string()))
    }

    /// Store `value` under `key`, expiring after `ttl` (at least one second).
    pub async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ResourceError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| ResourceError::Cache(e.to_string()))
    }

    /// Remove `key`; returns whether it existed.
    pub async fn delete(&self, key: &str) -> Result<bool, ResourceError> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn
            .del(key)
            .await
            .map_err(|e| ResourceError::Cache(e.to_string()))?;
        Ok(removed > 0)
    }

    /// Close the pool. Pending and future `get`s fail.
    pub fn close(&self) {
        self.pool.close();
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

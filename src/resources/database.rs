//! Relational database handle.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::resources::ResourceError;

/// Process-wide PostgreSQL pool. Cloning shares the same pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the pool and verify the server answers a trivial query.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ResourceError> {
        let pool = Self::options(config)
            .connect(&config.url)
            .await
            .map_err(|e| ResourceError::Database(e.to_string()))?;

        let database = Self { pool };
        database.ping().await?;
        Ok(database)
    }

    /// Build the pool without opening a connection. Connections are made on
    /// first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, ResourceError> {
        let pool = Self::options(config)
            .connect_lazy(&config.url)
            .map_err(|e| ResourceError::Database(e.to_string()))?;
        Ok(Self { pool })
    }

    fn options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
    }

    /// Liveness check.
    pub async fn ping(&self) -> Result<(), ResourceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ResourceError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection. Later queries fail with `PoolClosed`.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

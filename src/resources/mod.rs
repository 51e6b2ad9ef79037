//! Long-lived resource handles.
//!
//! # Data Flow
//! ```text
//! AppConfig
//!     → database.rs (PgPool + SELECT 1)
//!     → cache.rs (Redis pool + PING/PONG)
//!     → mail.rs (HTTP mail API client)
//!     → Resources (shared by every handler, closed once at shutdown)
//! ```
//!
//! # Design Decisions
//! - Strictly sequential, fail-fast initialization: database, cache, mail
//! - Handles created before a failing step are closed before the error returns
//! - Shutdown closes handles in reverse creation order

pub mod cache;
pub mod database;
pub mod mail;

use async_trait::async_trait;

use crate::config::{AppConfig, CacheConfig, DatabaseConfig, MailConfig};

pub use cache::Cache;
pub use database::Database;
pub use mail::{Email, Mailer};

/// Error type for resource initialization and use.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("database: {0}")]
    Database(String),

    #[error("cache: {0}")]
    Cache(String),

    #[error("cache answered PING with `{0}` instead of PONG")]
    UnexpectedPing(String),

    #[error("mail: {0}")]
    Mail(String),
}

/// Creates each resource handle from its configuration fragment.
#[async_trait]
pub trait ResourceInitializer: Send + Sync {
    async fn database(&self, config: &DatabaseConfig) -> Result<Database, ResourceError>;

    async fn cache(&self, config: &CacheConfig) -> Result<Cache, ResourceError>;

    async fn mail(&self, config: &MailConfig) -> Result<Mailer, ResourceError>;
}

/// Connects to the real backends named in the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveInitializer;

#[async_trait]
impl ResourceInitializer for LiveInitializer {
    async fn database(&self, config: &DatabaseConfig) -> Result<Database, ResourceError> {
        Database::connect(config).await
    }

    async fn cache(&self, config: &CacheConfig) -> Result<Cache, ResourceError> {
        Cache::connect(config).await
    }

    async fn mail(&self, config: &MailConfig) -> Result<Mailer, ResourceError> {
        Mailer::new(config)
    }
}

/// Every shared handle, created once per process.
#[derive(Clone, Debug)]
pub struct Resources {
    pub database: Database,
    pub cache: Cache,
    pub mailer: Mailer,
}

impl Resources {
    /// Initialize database, cache and mail in that order.
    pub async fn initialize(
        init: &dyn ResourceInitializer,
        database: &DatabaseConfig,
        config: &AppConfig,
    ) -> Result<Self, ResourceError> {
        let database = init.database(database).await?;
        tracing::info!("Database client was set");

        let cache = match init.cache(&config.cache).await {
            Ok(cache) => cache,
            Err(e) => {
                database.close().await;
                return Err(e);
            }
        };
        tracing::info!("Cache client was set");

        let mailer = match init.mail(&config.mail).await {
            Ok(mailer) => mailer,
            Err(e) => {
                cache.close();
                database.close().await;
                return Err(e);
            }
        };
        tracing::info!(sender = %mailer.sender(), "Mail client was set");

        Ok(Self {
            database,
            cache,
            mailer,
        })
    }

    /// Close every handle in reverse creation order.
    pub async fn close(self) {
        // The mail client holds no server-side session.
        drop(self.mailer);
        self.cache.close();
        self.database.close().await;
        tracing::info!("Resources closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Hands out lazy handles and fails at a chosen step.
    struct Scripted {
        fail_at: Option<&'static str>,
        handed_out: Mutex<Vec<(&'static str, Option<Database>, Option<Cache>)>>,
    }

    impl Scripted {
        fn failing_at(step: Option<&'static str>) -> Self {
            Self {
                fail_at: step,
                handed_out: Mutex::new(Vec::new()),
            }
        }

        fn steps(&self) -> Vec<&'static str> {
            self.handed_out.lock().unwrap().iter().map(|s| s.0).collect()
        }
    }

    #[async_trait]
    impl ResourceInitializer for Scripted {
        async fn database(&self, config: &DatabaseConfig) -> Result<Database, ResourceError> {
            if self.fail_at == Some("database") {
                return Err(ResourceError::Database("refused".into()));
            }
            let db = Database::connect_lazy(config)?;
            self.handed_out.lock().unwrap().push(("database", Some(db.clone()), None));
            Ok(db)
        }

        async fn cache(&self, config: &CacheConfig) -> Result<Cache, ResourceError> {
            if self.fail_at == Some("cache") {
                return Err(ResourceError::UnexpectedPing("nope".into()));
            }
            let cache = Cache::connect_lazy(config)?;
            self.handed_out.lock().unwrap().push(("cache", None, Some(cache.clone())));
            Ok(cache)
        }

        async fn mail(&self, config: &MailConfig) -> Result<Mailer, ResourceError> {
            if self.fail_at == Some("mail") {
                return Err(ResourceError::Mail("bad url".into()));
            }
            self.handed_out.lock().unwrap().push(("mail", None, None));
            Mailer::new(config)
        }
    }

    fn config() -> (DatabaseConfig, AppConfig) {
        let db = DatabaseConfig {
            url: "postgres://localhost/twinport".to_string(),
            max_connections: 1,
            acquire_timeout_secs: 1,
        };
        let mut config = AppConfig::default();
        config.database.insert("dev".to_string(), db.clone());
        config.mail.sender = "noreply@example.com".to_string();
        (db, config)
    }

    #[tokio::test]
    async fn initializes_in_order() {
        let (db, config) = config();
        let init = Scripted::failing_at(None);

        let resources = Resources::initialize(&init, &db, &config).await.unwrap();
        assert_eq!(init.steps(), vec!["database", "cache", "mail"]);

        resources.close().await;
        let handed_out = init.handed_out.lock().unwrap();
        assert!(handed_out[0].1.as_ref().unwrap().is_closed());
        assert!(handed_out[1].2.as_ref().unwrap().is_closed());
    }

    #[tokio::test]
    async fn first_failure_stops_the_sequence() {
        let (db, config) = config();
        let init = Scripted::failing_at(Some("database"));

        let err = Resources::initialize(&init, &db, &config).await.unwrap_err();
        assert!(matches!(err, ResourceError::Database(_)));
        assert!(init.steps().is_empty());
    }

    #[tokio::test]
    async fn earlier_handles_are_closed_on_failure() {
        let (db, config) = config();
        let init = Scripted::failing_at(Some("mail"));

        let err = Resources::initialize(&init, &db, &config).await.unwrap_err();
        assert!(matches!(err, ResourceError::Mail(_)));

        let handed_out = init.handed_out.lock().unwrap();
        assert!(handed_out[0].1.as_ref().unwrap().is_closed());
        assert!(handed_out[1].2.as_ref().unwrap().is_closed());
    }

    #[tokio::test]
    async fn cache_failure_closes_database() {
        let (db, config) = config();
        let init = Scripted::failing_at(Some("cache"));

        let err = Resources::initialize(&init, &db, &config).await.unwrap_err();
        assert!(matches!(err, ResourceError::UnexpectedPing(_)));
        assert_eq!(init.steps(), vec!["database"]);
        assert!(init.handed_out.lock().unwrap()[0].1.as_ref().unwrap().is_closed());
    }
}

//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot
//! work. Every problem is reported, not just the first.

use crate::config::schema::AppConfig;

/// A semantic problem in an otherwise well-formed configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Server.{0} must not be 0")]
    ZeroPort(&'static str),

    #[error("Server.GRPCPort and Server.RESTPort must differ (both {0})")]
    PortClash(u16),

    #[error("DB.{0}.URL must not be empty")]
    EmptyDatabaseUrl(String),

    #[error("DB.{0}.MaxConnections must be at least 1")]
    ZeroDatabasePool(String),

    #[error("Redis.URL must not be empty")]
    EmptyCacheUrl,

    #[error("Redis.PoolSize must be at least 1")]
    ZeroCachePool,

    #[error("Mail.Sender must not be empty")]
    EmptyMailSender,

    #[error("Mail.BaseURL must start with http:// or https:// (got `{0}`)")]
    InvalidMailUrl(String),
}

/// Check a parsed configuration. Pure: no I/O, no mutation.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let server = &config.server;
    if server.grpc_port == 0 {
        errors.push(ValidationError::ZeroPort("GRPCPort"));
    }
    if server.rest_port == 0 {
        errors.push(ValidationError::ZeroPort("RESTPort"));
    }
    if server.grpc_port != 0 && server.grpc_port == server.rest_port {
        errors.push(ValidationError::PortClash(server.grpc_port));
    }

    let mut sections: Vec<_> = config.database.iter().collect();
    sections.sort_by(|a, b| a.0.cmp(b.0));
    for (name, db) in sections {
        if db.url.trim().is_empty() {
            errors.push(ValidationError::EmptyDatabaseUrl(name.clone()));
        }
        if db.max_connections == 0 {
            errors.push(ValidationError::ZeroDatabasePool(name.clone()));
        }
    }

    if config.cache.url.trim().is_empty() {
        errors.push(ValidationError::EmptyCacheUrl);
    }
    if config.cache.pool_size == 0 {
        errors.push(ValidationError::ZeroCachePool);
    }

    if config.mail.sender.trim().is_empty() {
        errors.push(ValidationError::EmptyMailSender);
    }
    let base_url = &config.mail.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ValidationError::InvalidMailUrl(base_url.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

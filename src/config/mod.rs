//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! configs.toml
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig::apply_mode (--prod overrides)
//!     → AppConfig (immutable, borrowed by initializers)
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup; there is no reload
//! - Sections carry defaults where a default can work
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, CONFIG_PATH};
pub use schema::{
    AppConfig, CacheConfig, CommonConfig, DatabaseConfig, MailConfig, Mode, ServerConfig,
};
pub use validation::ValidationError;

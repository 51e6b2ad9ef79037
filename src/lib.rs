//! Twin-server backend: an RPC server on loopback and a REST gateway that
//! translates HTTP/JSON into RPC calls, sharing database, cache and mail
//! handles.

pub mod config;
pub mod controllers;
pub mod gateway;
pub mod lifecycle;
pub mod observability;
pub mod resources;
pub mod rpc;

pub use config::schema::{AppConfig, Mode};
pub use controllers::Controllers;
pub use lifecycle::{Shutdown, Supervisor, SupervisorError};
pub use resources::{LiveInitializer, ResourceInitializer, Resources};
pub use rpc::HandlerSet;

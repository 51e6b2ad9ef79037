//! REST-to-RPC gateway subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP request on :<RESTPort>
//!     → server.rs (middleware stack, axum::serve)
//!     → cors.rs (CORS headers, method gate)
//!     → routes.rs (JSON/path → RPC message, one call per request)
//!     → metadata.rs (headers → RPC metadata)
//!     → RPC server over the loopback channel
//!     → error.rs (RPC status → HTTP status + JSON body)
//! ```

pub mod cors;
pub mod error;
pub mod metadata;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, connect, GatewayError, GatewayServer};

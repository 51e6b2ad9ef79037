//! RPC subsystem.
//!
//! # Data Flow
//! ```text
//! TCP 127.0.0.1:<GRPCPort>
//!     → server.rs (tonic transport)
//!     → recovery.rs (panic → INTERNAL, per call)
//!     → generated Auth / Users services (proto.rs)
//!     → handler implementations (HandlerSet)
//! ```

pub mod proto;
pub mod recovery;
pub mod server;

use tonic::service::Routes;

use crate::resources::Resources;

pub use server::{RpcError, RpcServer};

/// Supplies the business handlers served by the RPC server.
///
/// Handlers receive the shared resource handles when they are built; they
/// never reach for process-wide globals.
pub trait HandlerSet: Send + Sync + 'static {
    fn routes(&self, resources: &Resources) -> Routes;
}

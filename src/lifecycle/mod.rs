//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (supervisor.rs):
//!     Select DB section → Initialize resources → Bind RPC → Connect gateway → Bind gateway
//!
//! Shutdown (shutdown.rs):
//!     Signal or server failure → Stop accepting → Drain (bounded) → Close resources
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Process (process.rs):
//!     Load config → Logging/metrics → Supervisor task → Exit status
//!
//! Phases (phase.rs):
//!     Unstarted → Listening → Stopped, per server
//! ```
//!
//! # Design Decisions
//! - Ordered startup: resources first, listeners last
//! - Ordered shutdown: stop accept, drain, close in reverse order
//! - Draining has a deadline: servers still busy afterwards are aborted

pub mod phase;
pub mod process;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use phase::{Phase, PhaseTracker};
pub use process::{launch, EXIT_FAILURE, EXIT_SUCCESS};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use supervisor::{Supervisor, SupervisorError};

//! Process entry.
//!
//! Everything the binary does after parsing its flags: load configuration,
//! install logging and metrics, run the supervisor until `stop` resolves,
//! and turn the outcome into an exit status.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use crate::config::Mode;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::supervisor::{Supervisor, SupervisorError};
use crate::observability::logging::{self, LoggingError};
use crate::observability::metrics;
use crate::resources::ResourceInitializer;
use crate::rpc::HandlerSet;

/// Exit status after a requested shutdown.
pub const EXIT_SUCCESS: u8 = 0;

/// Exit status after any fatal error.
pub const EXIT_FAILURE: u8 = 1;

/// Run the whole process and return its exit status.
///
/// `stop` is the termination trigger (a signal watcher in the binary). A
/// panic in the supervisor is reported as [`EXIT_FAILURE`].
pub async fn launch<H, S>(
    config_path: &Path,
    mode: Mode,
    initializer: Arc<dyn ResourceInitializer>,
    handlers: H,
    stop: S,
) -> u8
where
    H: HandlerSet,
    S: Future<Output = ()> + Send + 'static,
{
    let supervisor = match Supervisor::load(config_path, mode, initializer, handlers) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            logging::init_fallback();
            return fatal(e);
        }
    };

    match logging::init(&supervisor.config().common, mode) {
        Ok(()) => {}
        Err(LoggingError::AlreadyInstalled) => {
            tracing::debug!("Keeping the already installed log subscriber");
        }
        Err(e) => {
            logging::init_fallback();
            return fatal(e.into());
        }
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = ?mode,
        grpc_port = supervisor.config().server.grpc_port,
        rest_port = supervisor.config().server.rest_port,
        "Configuration loaded"
    );

    if let Some(address) = &supervisor.config().common.metrics_address {
        match address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    let watcher = tokio::spawn(async move {
        stop.await;
        trigger.trigger();
    });

    let outcome = tokio::spawn(supervisor.run(shutdown)).await;
    watcher.abort();

    match outcome {
        Ok(Ok(())) => {
            tracing::info!("Shutdown");
            EXIT_SUCCESS
        }
        Ok(Err(e)) => fatal(e),
        Err(e) => {
            tracing::error!(error = %e, "Supervisor panicked");
            tracing::info!("Shutdown");
            EXIT_FAILURE
        }
    }
}

fn fatal(e: SupervisorError) -> u8 {
    tracing::error!(error = %e, "Fatal error");
    e.exit_code()
}

//! Process supervisor.
//!
//! # Responsibilities
//! - Select the database section for the run mode
//! - Initialize shared resources (fail fast, nothing bound on failure)
//! - Start the RPC server, then the gateway in front of it
//! - On shutdown or on the first server failure, stop both servers, wait a
//!   bounded time for them to drain, then close resources
//!
//! # Design Decisions
//! - The RPC server runs in a spawned task; the gateway runs in the
//!   supervisor's own task
//! - One [`Shutdown`] coordinates both servers, so a failure in either stops
//!   the other
//! - Draining is bounded by `Server.ShutdownGraceSecs`, counted from the
//!   moment shutdown is triggered. A server still busy at the deadline is
//!   aborted and its in-flight requests are abandoned
//! - The gateway access log follows `Common.Dev` rather than the `--prod`
//!   flag alone, so a development run can switch it off. `--prod` always
//!   clears `Common.Dev`

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::config::{load_config, AppConfig, ConfigError, Mode};
use crate::gateway::{self, GatewayError, GatewayServer};
use crate::lifecycle::phase::{Phase, PhaseTracker};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::logging::LoggingError;
use crate::resources::{ResourceError, ResourceInitializer, Resources};
use crate::rpc::{HandlerSet, RpcError, RpcServer};

/// Fatal error that ends the process.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("resource initialization failed: {0}")]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0} panicked")]
    Panicked(&'static str),
}

impl SupervisorError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

type GatewayFuture = Pin<Box<dyn Future<Output = Result<(), GatewayError>> + Send>>;

enum FirstStopped {
    Gateway(Result<(), GatewayError>),
    Rpc(Result<Result<(), RpcError>, JoinError>),
}

pub struct Supervisor<H> {
    config: AppConfig,
    mode: Mode,
    initializer: Arc<dyn ResourceInitializer>,
    handlers: H,
    rpc_phase: PhaseTracker,
    gateway_phase: PhaseTracker,
}

impl<H: HandlerSet> Supervisor<H> {
    pub fn new(
        mut config: AppConfig,
        mode: Mode,
        initializer: Arc<dyn ResourceInitializer>,
        handlers: H,
    ) -> Self {
        config.apply_mode(mode);
        Self {
            config,
            mode,
            initializer,
            handlers,
            rpc_phase: PhaseTracker::new(),
            gateway_phase: PhaseTracker::new(),
        }
    }

    /// Load the configuration file and build a supervisor from it.
    pub fn load(
        path: &Path,
        mode: Mode,
        initializer: Arc<dyn ResourceInitializer>,
        handlers: H,
    ) -> Result<Self, SupervisorError> {
        let config = load_config(path)?;
        Ok(Self::new(config, mode, initializer, handlers))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn rpc_phase(&self) -> watch::Receiver<Phase> {
        self.rpc_phase.subscribe()
    }

    pub fn gateway_phase(&self) -> watch::Receiver<Phase> {
        self.gateway_phase.subscribe()
    }

    /// Run until `shutdown` is triggered or a server fails.
    ///
    /// Returns `Ok` only for a requested shutdown. Resources are closed
    /// before returning whenever they were initialized.
    pub async fn run(self, shutdown: Shutdown) -> Result<(), SupervisorError> {
        let database = self.config.database_for(self.mode)?;
        tracing::info!(
            mode = ?self.mode,
            database = self.mode.database_key(),
            "Initializing resources"
        );

        let resources =
            Resources::initialize(self.initializer.as_ref(), database, &self.config).await?;

        let result = self.serve(&resources, &shutdown).await;

        resources.close().await;
        result
    }

    async fn serve(&self, resources: &Resources, shutdown: &Shutdown) -> Result<(), SupervisorError> {
        let rpc = RpcServer::bind(self.config.server.grpc_port, self.rpc_phase.clone()).await?;
        let rpc_addr = rpc.local_addr();
        let routes = self.handlers.routes(resources);
        let mut rpc_task = tokio::spawn(rpc.serve(routes, shutdown.subscribe().recv()));

        let mut gateway: GatewayFuture = match self.start_gateway(rpc_addr, shutdown).await {
            Ok(gateway) => gateway,
            Err(e) => {
                shutdown.trigger();
                let _ = self.drain_rpc(rpc_task, Instant::now() + self.grace()).await;
                return Err(e);
            }
        };

        tracing::info!(rpc_address = %rpc_addr, "Servers running");

        let first = tokio::select! {
            result = &mut gateway => Some(FirstStopped::Gateway(result)),
            joined = &mut rpc_task => Some(FirstStopped::Rpc(joined)),
            () = shutdown.subscribe().recv() => None,
        };

        // Whichever server ends first, the other one is told to stop. Both
        // drains share one deadline.
        shutdown.trigger();
        let deadline = Instant::now() + self.grace();
        match first {
            Some(FirstStopped::Gateway(result)) => {
                let rpc_result = self.drain_rpc(rpc_task, deadline).await;
                result.map_err(SupervisorError::from).and(rpc_result)
            }
            Some(FirstStopped::Rpc(joined)) => {
                let rpc_result = rpc_outcome(joined);
                let gateway_result = self.drain_gateway(gateway, deadline).await;
                rpc_result.and(gateway_result)
            }
            None => {
                tracing::info!(
                    grace_secs = self.config.server.shutdown_grace_secs,
                    "Draining in-flight requests"
                );
                let (gateway_result, rpc_result) = tokio::join!(
                    self.drain_gateway(gateway, deadline),
                    self.drain_rpc(rpc_task, deadline),
                );
                gateway_result.and(rpc_result)
            }
        }
    }

    async fn start_gateway(
        &self,
        rpc_addr: std::net::SocketAddr,
        shutdown: &Shutdown,
    ) -> Result<GatewayFuture, SupervisorError> {
        let channel = gateway::connect(rpc_addr).await?;
        let server =
            GatewayServer::bind(self.config.server.rest_port, self.gateway_phase.clone()).await?;
        let router = gateway::build_router(channel, self.config.common.dev);
        Ok(Box::pin(server.serve(router, shutdown.subscribe().recv())))
    }

    fn grace(&self) -> Duration {
        Duration::from_secs(self.config.server.shutdown_grace_secs)
    }

    async fn drain_rpc(
        &self,
        mut task: JoinHandle<Result<(), RpcError>>,
        deadline: Instant,
    ) -> Result<(), SupervisorError> {
        match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(joined) => rpc_outcome(joined),
            Err(_) => {
                tracing::warn!(
                    grace_secs = self.config.server.shutdown_grace_secs,
                    "RPC server did not drain in time, aborting"
                );
                task.abort();
                // Resolves once the aborted task has dropped its listener.
                let _ = task.await;
                self.rpc_phase.set(Phase::Stopped);
                Ok(())
            }
        }
    }

    async fn drain_gateway(
        &self,
        gateway: GatewayFuture,
        deadline: Instant,
    ) -> Result<(), SupervisorError> {
        match tokio::time::timeout_at(deadline, gateway).await {
            Ok(result) => result.map_err(SupervisorError::from),
            Err(_) => {
                tracing::warn!(
                    grace_secs = self.config.server.shutdown_grace_secs,
                    "Gateway did not drain in time, abandoning in-flight requests"
                );
                self.gateway_phase.set(Phase::Stopped);
                Ok(())
            }
        }
    }
}

fn rpc_outcome(joined: Result<Result<(), RpcError>, JoinError>) -> Result<(), SupervisorError> {
    match joined {
        Ok(result) => result.map_err(SupervisorError::from),
        Err(e) if e.is_panic() => {
            tracing::error!(error = %e, "RPC server task panicked");
            Err(SupervisorError::Panicked("RPC server"))
        }
        Err(_) => Ok(()),
    }
}

//! RPC listener.
//!
//! # Responsibilities
//! - Bind `127.0.0.1:<GRPCPort>` (loopback only)
//! - Serve the supplied handler routes behind the panic-recovery layer
//! - Stop accepting when the shutdown future resolves

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::Routes;
use tonic::transport::Server;

use crate::lifecycle::phase::{Phase, PhaseTracker};
use crate::rpc::recovery;

/// Error type for the RPC server.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("failed to bind RPC listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("RPC server failed: {0}")]
    Serve(#[from] tonic::transport::Error),
}

/// A bound RPC server. Serving consumes it; a stopped server cannot restart.
pub struct RpcServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    phase: PhaseTracker,
}

impl RpcServer {
    /// Bind the loopback listener. Port 0 picks a free port.
    pub async fn bind(port: u16, phase: PhaseTracker) -> Result<Self, RpcError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RpcError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| RpcError::Bind { addr, source })?;

        phase.set(Phase::Listening);
        tracing::info!(address = %local_addr, "RPC listener bound");

        Ok(Self {
            listener,
            local_addr,
            phase,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve `routes` until `shutdown` resolves.
    pub async fn serve<F>(self, routes: Routes, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!(address = %self.local_addr, "RPC server starting");

        let result = Server::builder()
            .layer(recovery::layer())
            .add_routes(routes)
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), shutdown)
            .await;

        self.phase.set(Phase::Stopped);
        tracing::info!("RPC server stopped");
        result.map_err(RpcError::from)
    }
}

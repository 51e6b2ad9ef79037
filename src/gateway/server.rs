//! HTTP gateway server.
//!
//! # Responsibilities
//! - Open the internal channel to the RPC server
//! - Build the route multiplexer and wrap it in middleware
//! - Bind `0.0.0.0:<RESTPort>` and serve until shutdown
//!
//! Middleware, outermost first: access log (optional) → request metrics →
//! request id → CORS → method gate → routes.
//!
//! The access log is on when `Common.Dev` is set. `--prod` clears that flag,
//! and a development run may clear it too.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tonic::transport::{Channel, Endpoint};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::gateway::cors;
use crate::gateway::routes::{self, GatewayState};
use crate::lifecycle::phase::{Phase, PhaseTracker};
use crate::observability::metrics;

/// Error type for the gateway server.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to connect to RPC server at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("failed to bind gateway listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("gateway server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Open the internal channel to the RPC server. Fails if nothing answers.
pub async fn connect(rpc_addr: SocketAddr) -> Result<Channel, GatewayError> {
    let to_error = |source| GatewayError::Connect {
        addr: rpc_addr,
        source,
    };
    let channel = Endpoint::from_shared(format!("http://{rpc_addr}"))
        .map_err(to_error)?
        .connect()
        .await
        .map_err(to_error)?;

    tracing::info!(rpc_address = %rpc_addr, "Gateway connected to RPC server");
    Ok(channel)
}

/// Build the full middleware stack around the route multiplexer.
pub fn build_router(channel: Channel, access_log: bool) -> Router {
    let router = routes::router(GatewayState::new(channel))
        .layer(middleware::from_fn(cors::method_gate))
        .layer(cors::cors_layer())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(middleware::from_fn(track_request));

    if access_log {
        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
    } else {
        router
    }
}

async fn track_request(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

/// A bound gateway. Serving consumes it; a stopped gateway cannot restart.
pub struct GatewayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    phase: PhaseTracker,
}

impl GatewayServer {
    /// Bind on all interfaces. Port 0 picks a free port.
    pub async fn bind(port: u16, phase: PhaseTracker) -> Result<Self, GatewayError> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| GatewayError::Bind { addr, source })?;

        phase.set(Phase::Listening);
        tracing::info!(address = %local_addr, "Gateway listener bound");

        Ok(Self {
            listener,
            local_addr,
            phase,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve `router` until `shutdown` resolves. In-flight requests finish
    /// first; the RPC channel is dropped with the router.
    pub async fn serve<F>(self, router: Router, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(address = %self.local_addr, "Gateway server starting");

        let result = axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        self.phase.set(Phase::Stopped);
        tracing::info!("Gateway server stopped");
        result.map_err(GatewayError::Serve)
    }
}

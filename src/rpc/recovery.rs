//! Per-call panic recovery.
//!
//! Every RPC passes through a `CatchPanicLayer`. A panic inside a handler is
//! turned into an `INTERNAL` status for that call; the connection and the
//! server stay up.
//!
//! Only panics raised while the handler is called, or while its response
//! future is polled, are caught. That covers unary calls and the setup of a
//! streaming call. A panic while a streaming response body is being read
//! happens after the response headers are sent and is not converted; the
//! stream is reset instead.

use std::any::Any;

use tonic::codegen::http;
use tonic::Status;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::observability::metrics;

/// Message returned to the caller of a call that panicked.
pub const PANIC_MESSAGE: &str = "internal error";

/// Converts a caught panic into a gRPC `INTERNAL` response.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicToStatus;

impl ResponseForPanic for PanicToStatus {
    type ResponseBody = String;

    fn response_for_panic(
        &mut self,
        err: Box<dyn Any + Send + 'static>,
    ) -> http::Response<Self::ResponseBody> {
        tracing::error!(panic = %panic_message(err.as_ref()), "Recovered from panic in RPC handler");
        metrics::record_recovered_panic();
        Status::internal(PANIC_MESSAGE).into_http()
    }
}

/// The recovery layer applied to the RPC server.
pub fn layer() -> CatchPanicLayer<PanicToStatus> {
    CatchPanicLayer::custom(PanicToStatus)
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

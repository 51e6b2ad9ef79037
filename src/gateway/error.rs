//! Translation of RPC failures into HTTP responses.
//!
//! Every `tonic::Status` maps to an HTTP status; none is dropped. The body
//! mirrors the RPC error: `{"code": <rpc code>, "message": ..., "details": []}`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tonic::{Code, Status};

/// Status used for calls the client abandoned (`CANCELLED`).
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// HTTP status for an RPC status code.
pub fn http_status(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        Code::Cancelled => {
            StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
            StatusCode::BAD_REQUEST
        }
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists | Code::Aborted => StatusCode::CONFLICT,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        // Unknown, Internal, DataLoss
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Failure of a single gateway request.
#[derive(Debug)]
pub enum ApiError {
    /// The RPC call returned an error status.
    Rpc(Status),
    /// The HTTP request could not be turned into an RPC message.
    BadRequest(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, Code, &str) {
        match self {
            ApiError::Rpc(status) => (http_status(status.code()), status.code(), status.message()),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Code::InvalidArgument, message.as_str())
            }
        }
    }
}

impl From<Status> for ApiError {
    fn from(status: Status) -> Self {
        ApiError::Rpc(status)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::warn!(rpc_code = ?code, message = %message, "RPC call failed");
        }
        let body = serde_json::json!({
            "code": code as i32,
            "message": message,
            "details": [],
        });
        (status, Json(body)).into_response()
    }
}

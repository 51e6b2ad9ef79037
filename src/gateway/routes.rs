//! REST routes, one per RPC method.
//!
//! | Route                       | RPC                  |
//! |-----------------------------|----------------------|
//! | `POST /v1/auth/login`       | `Auth.Login`         |
//! | `POST /v1/auth/verify`      | `Auth.Verify`        |
//! | `POST /v1/auth/logout`      | `Auth.Logout`        |
//! | `POST /v1/users`            | `Users.CreateUser`   |
//! | `GET /v1/users/{id}`        | `Users.GetUser`      |
//! | `PUT, PATCH /v1/users/{id}` | `Users.UpdateUser`   |
//! | `DELETE /v1/users/{id}`     | `Users.DeleteUser`   |

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use tonic::transport::Channel;

use crate::gateway::error::ApiError;
use crate::gateway::metadata::rpc_request;
use crate::rpc::proto::auth::{
    auth_client::AuthClient, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse,
    VerifyRequest, VerifyResponse,
};
use crate::rpc::proto::users::{
    users_client::UsersClient, CreateUserRequest, DeleteUserRequest, DeleteUserResponse,
    GetUserRequest, UpdateUserRequest, User,
};

/// RPC clients shared by every handler. Clones share the channel.
#[derive(Clone)]
pub struct GatewayState {
    auth: AuthClient<Channel>,
    users: UsersClient<Channel>,
}

impl GatewayState {
    pub fn new(channel: Channel) -> Self {
        Self {
            auth: AuthClient::new(channel.clone()),
            users: UsersClient::new(channel),
        }
    }
}

/// The route multiplexer.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/verify", post(verify))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/users", post(create_user))
        .route(
            "/v1/users/{id}",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn login(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(message) = body?;
    let response = state.auth.clone().login(rpc_request(&headers, message)).await?;
    Ok(Json(response.into_inner()))
}

async fn verify(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<VerifyResponse> {
    let Json(message) = body?;
    let response = state.auth.clone().verify(rpc_request(&headers, message)).await?;
    Ok(Json(response.into_inner()))
}

async fn logout(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Json<LogoutRequest>, JsonRejection>,
) -> ApiResult<LogoutResponse> {
    let Json(message) = body?;
    let response = state.auth.clone().logout(rpc_request(&headers, message)).await?;
    Ok(Json(response.into_inner()))
}

async fn create_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(message) = body?;
    let response = state
        .users
        .clone()
        .create_user(rpc_request(&headers, message))
        .await?;
    Ok(Json(response.into_inner()))
}

async fn get_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<User> {
    let Path(id) = id?;
    let message = GetUserRequest { id };
    let response = state
        .users
        .clone()
        .get_user(rpc_request(&headers, message))
        .await?;
    Ok(Json(response.into_inner()))
}

async fn update_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Path(id) = id?;
    let Json(mut message) = body?;
    // The path wins over any id in the body.
    message.id = id;
    let response = state
        .users
        .clone()
        .update_user(rpc_request(&headers, message))
        .await?;
    Ok(Json(response.into_inner()))
}

async fn delete_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<DeleteUserResponse> {
    let Path(id) = id?;
    let message = DeleteUserRequest { id };
    let response = state
        .users
        .clone()
        .delete_user(rpc_request(&headers, message))
        .await?;
    Ok(Json(response.into_inner()))
}

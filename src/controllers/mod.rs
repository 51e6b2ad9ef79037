//! Business handlers served over RPC.
//!
//! Thin collaborators: they validate input, talk to the shared resources and
//! map failures onto RPC status codes.

pub mod auth;
pub mod users;

use tonic::service::Routes;
use tonic::Status;

use crate::resources::{ResourceError, Resources};
use crate::rpc::proto::auth::auth_server::AuthServer;
use crate::rpc::proto::users::users_server::UsersServer;
use crate::rpc::HandlerSet;

pub use auth::AuthRpc;
pub use users::UsersRpc;

/// The production handler set: `auth` and `users`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Controllers;

impl HandlerSet for Controllers {
    fn routes(&self, resources: &Resources) -> Routes {
        Routes::new(AuthServer::new(AuthRpc::new(resources.clone())))
            .add_service(UsersServer::new(UsersRpc::new(resources.clone())))
    }
}

impl From<ResourceError> for Status {
    fn from(err: ResourceError) -> Self {
        tracing::error!(error = %err, "Resource call failed");
        Status::unavailable(err.to_string())
    }
}

/// Map a database error to an RPC status.
pub(crate) fn db_status(err: sqlx::Error) -> Status {
    match err {
        sqlx::Error::RowNotFound => Status::not_found("not found"),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Status::already_exists("already exists")
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            tracing::error!(error = %err, "Database unavailable");
            Status::unavailable("database unavailable")
        }
        other => {
            tracing::error!(error = %other, "Database query failed");
            Status::internal("database error")
        }
    }
}

/// Lower-case and sanity-check an email address.
pub(crate) fn normalize_email(raw: &str) -> Result<String, Status> {
    let email = raw.trim().to_lowercase();
    let valid = email.len() <= 254
        && matches!(email.split_once('@'), Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@'));
    if valid {
        Ok(email)
    } else {
        Err(Status::invalid_argument("invalid email address"))
    }
}

//! `Users` service: CRUD over the `users` table.

use sqlx::{FromRow, PgPool};
use tonic::{Request, Response, Status};

use crate::controllers::{db_status, normalize_email};
use crate::resources::Resources;
use crate::rpc::proto::users::{
    users_server::Users, CreateUserRequest, DeleteUserRequest, DeleteUserResponse,
    GetUserRequest, UpdateUserRequest, User,
};

const MAX_NAME_LEN: usize = 128;

const SELECT_COLUMNS: &str =
    "id, email, name, EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    created_at: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: u64::try_from(row.id).unwrap_or_default(),
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

fn row_id(id: u64) -> Result<i64, Status> {
    match i64::try_from(id) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Status::invalid_argument("id must be a positive integer")),
    }
}

fn validate_name(raw: &str) -> Result<String, Status> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Status::invalid_argument("name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Status::invalid_argument(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Look up a user by normalized email.
pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, Status> {
    let query = format!("SELECT {SELECT_COLUMNS} FROM users WHERE email = $1");
    let row = sqlx::query_as::<_, UserRow>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(db_status)?;
    Ok(row.map(User::from))
}

pub struct UsersRpc {
    resources: Resources,
}

impl UsersRpc {
    pub fn new(resources: Resources) -> Self {
        Self { resources }
    }

    fn pool(&self) -> &PgPool {
        self.resources.database.pool()
    }
}

#[tonic::async_trait]
impl Users for UsersRpc {
    async fn get_user(&self, request: Request<GetUserRequest>) -> Result<Response<User>, Status> {
        let id = row_id(request.into_inner().id)?;

        let query = format!("SELECT {SELECT_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(db_status)?;

        Ok(Response::new(row.into()))
    }

    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> Result<Response<User>, Status> {
        let message = request.into_inner();
        let email = normalize_email(&message.email)?;
        let name = validate_name(&message.name)?;

        let query = format!(
            "INSERT INTO users (email, name) VALUES ($1, $2) RETURNING {SELECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&email)
            .bind(&name)
            .fetch_one(self.pool())
            .await
            .map_err(db_status)?;

        tracing::info!(user_id = row.id, "User created");
        Ok(Response::new(row.into()))
    }

    async fn update_user(
        &self,
        request: Request<UpdateUserRequest>,
    ) -> Result<Response<User>, Status> {
        let message = request.into_inner();
        let id = row_id(message.id)?;
        let name = validate_name(&message.name)?;

        let query = format!("UPDATE users SET name = $2 WHERE id = $1 RETURNING {SELECT_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(&name)
            .fetch_one(self.pool())
            .await
            .map_err(db_status)?;

        tracing::info!(user_id = row.id, "User updated");
        Ok(Response::new(row.into()))
    }

    async fn delete_user(
        &self,
        request: Request<DeleteUserRequest>,
    ) -> Result<Response<DeleteUserResponse>, Status> {
        let id = row_id(request.into_inner().id)?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(db_status)?;

        if result.rows_affected() == 0 {
            return Err(Status::not_found(format!("user {id} not found")));
        }

        tracing::info!(user_id = id, "User deleted");
        Ok(Response::new(DeleteUserResponse {}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn ids_must_fit_a_positive_bigint() {
        assert_eq!(row_id(42).unwrap(), 42);
        assert_eq!(row_id(0).unwrap_err().code(), Code::InvalidArgument);
        assert_eq!(row_id(u64::MAX).unwrap_err().code(), Code::InvalidArgument);
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(validate_name("  Ada Lovelace ").unwrap(), "Ada Lovelace");
        assert_eq!(validate_name("   ").unwrap_err().code(), Code::InvalidArgument);

        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(validate_name(&long).unwrap_err().code(), Code::InvalidArgument);
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn rows_convert_to_messages() {
        let user: User = UserRow {
            id: 7,
            email: "ada@example.com".into(),
            name: "Ada".into(),
            created_at: 1_700_000_000,
        }
        .into();
        assert_eq!(user.id, 7);
        assert_eq!(user.created_at, 1_700_000_000);
    }
}

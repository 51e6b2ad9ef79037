//! `Auth` service: passwordless login by mailed one-time code.
//!
//! ```text
//! Login(email)        → auth:code:<email> = "<user_id>:<code>"   (10 min)
//! Verify(email, code) → auth:session:<token> = "<user_id>"       (24 h)
//! Logout(token)       → delete auth:session:<token>
//! ```

use std::time::Duration;

use rand::Rng;
use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::controllers::{normalize_email, users};
use crate::resources::{Email, Resources};
use crate::rpc::proto::auth::{
    auth_server::Auth, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse, VerifyRequest,
    VerifyResponse,
};

pub const CODE_TTL: Duration = Duration::from_secs(10 * 60);
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const CODE_LEN: usize = 6;

fn code_key(email: &str) -> String {
    format!("auth:code:{email}")
}

fn session_key(token: &str) -> String {
    format!("auth:session:{token}")
}

fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{code:06}")
}

fn validate_code(raw: &str) -> Result<&str, Status> {
    let code = raw.trim();
    if code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(code)
    } else {
        Err(Status::invalid_argument("code must be six digits"))
    }
}

fn validate_token(raw: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(raw.trim()).map_err(|_| Status::invalid_argument("malformed session token"))
}

/// Split a stored `"<user_id>:<code>"` entry.
fn parse_pending(entry: &str) -> Option<(u64, &str)> {
    let (user_id, code) = entry.split_once(':')?;
    Some((user_id.parse().ok()?, code))
}

pub struct AuthRpc {
    resources: Resources,
}

impl AuthRpc {
    pub fn new(resources: Resources) -> Self {
        Self { resources }
    }
}

#[tonic::async_trait]
impl Auth for AuthRpc {
    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let email = normalize_email(&request.into_inner().email)?;

        let user = users::find_by_email(self.resources.database.pool(), &email)
            .await?
            .ok_or_else(|| Status::not_found("no user with that email"))?;

        let code = generate_code();
        self.resources
            .cache
            .set_ex(&code_key(&email), &format!("{}:{code}", user.id), CODE_TTL)
            .await?;

        let message = Email {
            to: email,
            subject: "Your sign-in code".to_string(),
            text_body: format!(
                "Your sign-in code is {code}. It expires in {} minutes.",
                CODE_TTL.as_secs() / 60
            ),
        };
        self.resources.mailer.send(&message).await?;

        tracing::info!(user_id = user.id, "Login code issued");
        Ok(Response::new(LoginResponse {
            expires_in: CODE_TTL.as_secs(),
        }))
    }

    async fn verify(
        &self,
        request: Request<VerifyRequest>,
    ) -> Result<Response<VerifyResponse>, Status> {
        let message = request.into_inner();
        let email = normalize_email(&message.email)?;
        let code = validate_code(&message.code)?;

        let key = code_key(&email);
        let entry = self
            .resources
            .cache
            .get(&key)
            .await?
            .ok_or_else(|| Status::unauthenticated("code expired or never issued"))?;

        let (user_id, expected) = parse_pending(&entry).ok_or_else(|| {
            tracing::error!(key = %key, "Malformed pending login entry");
            Status::internal("corrupt login state")
        })?;
        if expected != code {
            return Err(Status::unauthenticated("wrong code"));
        }

        // Single use.
        self.resources.cache.delete(&key).await?;

        let token = Uuid::new_v4().to_string();
        self.resources
            .cache
            .set_ex(&session_key(&token), &user_id.to_string(), SESSION_TTL)
            .await?;

        tracing::info!(user_id, "Session opened");
        Ok(Response::new(VerifyResponse {
            token,
            user_id,
            expires_in: SESSION_TTL.as_secs(),
        }))
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        let token = validate_token(&request.into_inner().token)?;

        if !self.resources.cache.delete(&session_key(&token.to_string())).await? {
            return Err(Status::unauthenticated("no such session"));
        }

        tracing::info!("Session closed");
        Ok(Response::new(LogoutResponse {}))
    }
}

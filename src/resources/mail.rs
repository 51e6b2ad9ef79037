//! Mail delivery client for an HTTP mail API.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;

use crate::config::MailConfig;
use crate::resources::ResourceError;

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "X-Mail-Server-Token";

/// One outgoing message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
}

/// `<base_url>/email`, keeping any path already present in the base.
fn endpoint_url(base_url: &str) -> Result<Url, ResourceError> {
    let mut endpoint = Url::parse(base_url).map_err(|e| ResourceError::Mail(e.to_string()))?;
    endpoint
        .path_segments_mut()
        .map_err(|()| ResourceError::Mail(format!("`{base_url}` cannot be a base URL")))?
        .pop_if_empty()
        .push("email");
    Ok(endpoint)
}

/// Process-wide mail client. Cloning shares the connection pool.
#[derive(Clone, Debug)]
pub struct Mailer {
    http: Client,
    endpoint: Url,
    sender: String,
    auth_token: String,
}

impl Mailer {
    /// Build the client. No request is made; the API has no liveness check.
    pub fn new(config: &MailConfig) -> Result<Self, ResourceError> {
        let endpoint = endpoint_url(&config.base_url)?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_millis))
            .build()
            .map_err(|e| ResourceError::Mail(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            sender: config.sender.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Deliver one message. Any non-2xx answer is an error.
    pub async fn send(&self, email: &Email) -> Result<(), ResourceError> {
        let body = SendEmailRequest {
            from: &self.sender,
            to: &email.to,
            subject: &email.subject,
            text_body: &email.text_body,
        };

        self.http
            .post(self.endpoint.clone())
            .header(TOKEN_HEADER, &self.auth_token)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ResourceError::Mail(e.to_string()))?;

        tracing::debug!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

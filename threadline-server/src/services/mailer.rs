//! Outbound email seam, used for password-reset links.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use shared::config::EmailConfig;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("email request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("email endpoint returned {0}")]
    Status(u16),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Resend HTTP API mailer.
pub struct ResendMailer {
    client: reqwest::Client,
    config: EmailConfig,
}

impl ResendMailer {
    #[must_use]
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[instrument(skip(self, html))]
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError> {
        let request = SendEmailRequest {
            from: &self.config.from,
            to,
            subject,
            html,
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailerError::Status(status.as_u16()));
        }
        Ok(())
    }
}

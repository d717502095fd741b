//! Account lifecycle: signup, login, and the password-reset round trip.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared::config::Config;
use shared::models::{AuthResponse, User};

use crate::auth::credentials::{Credentials, TokenPurpose};
use crate::services::mailer::{Mailer, MailerError};
use crate::services::thread_store::StoreError;
use crate::services::user_store::{UserRecord, UserStore};

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no account for that email")]
    UnknownEmail,
    #[error("invalid or expired reset token")]
    InvalidResetToken,
    #[error("{0}")]
    Validation(String),
    #[error("mailer error: {0}")]
    Mailer(#[from] MailerError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("password hashing failed")]
    Hash,
}

pub struct UserService {
    users: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    credentials: Credentials,
    config: Arc<Config>,
}

impl UserService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        credentials: Credentials,
        config: Arc<Config>,
    ) -> Self {
        Self {
            users,
            mailer,
            credentials,
            config,
        }
    }

    /// Registers a new account and opens a session for it.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, UserServiceError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(UserServiceError::Validation(
                "username, email and password are required".to_string(),
            ));
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
        };

        let created = match self.users.create_user(record).await {
            Ok(created) => created,
            Err(StoreError::DuplicateId(_)) => return Err(UserServiceError::DuplicateEmail),
            Err(err) => return Err(err.into()),
        };

        info!(user_id = %created.id, "user registered");
        Ok(self.session_for(&created))
    }

    /// Verifies the password and opens a session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, UserServiceError> {
        let Some(record) = self.users.find_by_email(email.trim()).await? else {
            return Err(UserServiceError::InvalidCredentials);
        };

        let parsed =
            PasswordHash::new(&record.password_hash).map_err(|_| UserServiceError::Hash)?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            warn!(user_id = %record.id, "login rejected");
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok(self.session_for(&record))
    }

    /// Emails a short-lived reset link to the account's address.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), UserServiceError> {
        let Some(record) = self.users.find_by_email(email.trim()).await? else {
            return Err(UserServiceError::UnknownEmail);
        };

        let token = self.credentials.issue(
            record.id,
            TokenPurpose::PasswordReset,
            Duration::minutes(self.config.auth.reset_token_ttl_minutes),
        );
        let link = format!(
            "{}/reset-password/{token}",
            self.config.public_base_url.trim_end_matches('/')
        );
        let html = format!(
            "<p>Click the link below to reset your password. It expires in {} minutes.</p>\
             <a href=\"{link}\">Reset password</a>",
            self.config.auth.reset_token_ttl_minutes
        );

        self.mailer
            .send(&record.email, "Reset your password", &html)
            .await?;
        info!(user_id = %record.id, "reset link sent");
        Ok(())
    }

    /// Consumes a reset token and replaces the stored password hash.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        if new_password.is_empty() {
            return Err(UserServiceError::Validation(
                "password is required".to_string(),
            ));
        }

        let owner_id = self
            .credentials
            .verify(token, TokenPurpose::PasswordReset)
            .map_err(|_| UserServiceError::InvalidResetToken)?;

        let hash = hash_password(new_password)?;
        match self.users.update_password(owner_id, &hash).await {
            Ok(()) => {
                info!(user_id = %owner_id, "password reset");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(UserServiceError::InvalidResetToken),
            Err(err) => Err(err.into()),
        }
    }

    fn session_for(&self, record: &UserRecord) -> AuthResponse {
        let token = self.credentials.issue(
            record.id,
            TokenPurpose::Session,
            Duration::hours(self.config.auth.token_ttl_hours),
        );
        AuthResponse {
            token,
            user: User {
                id: record.id,
                username: record.username.clone(),
                email: record.email.clone(),
            },
        }
    }
}

fn hash_password(password: &str) -> Result<String, UserServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| UserServiceError::Hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::services::user_store::MemoryUserStore;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError> {
            self.sent
                .lock()
                .await
                .push((to.to_string(), subject.to_string(), html.to_string()));
            Ok(())
        }
    }

    fn service(mailer: Arc<RecordingMailer>) -> UserService {
        let config = Arc::new(Config::with_defaults());
        UserService::new(
            Arc::new(MemoryUserStore::new()),
            mailer,
            Credentials::new(&config.auth.token_secret),
            config,
        )
    }

    #[tokio::test]
    async fn signup_then_login_round_trip() {
        let svc = service(Arc::new(RecordingMailer::default()));
        let signed_up = svc
            .signup("alice", "alice@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(signed_up.user.email, "alice@example.com");

        let logged_in = svc.login("alice@example.com", "hunter2").await.unwrap();
        assert_eq!(logged_in.user.id, signed_up.user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let svc = service(Arc::new(RecordingMailer::default()));
        svc.signup("alice", "alice@example.com", "hunter2")
            .await
            .unwrap();

        let result = svc.login("alice@example.com", "wrong").await;
        assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let svc = service(Arc::new(RecordingMailer::default()));
        svc.signup("alice", "alice@example.com", "hunter2")
            .await
            .unwrap();

        let result = svc.signup("alice2", "alice@example.com", "hunter3").await;
        assert!(matches!(result, Err(UserServiceError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn blank_fields_fail_validation() {
        let svc = service(Arc::new(RecordingMailer::default()));
        let result = svc.signup("  ", "alice@example.com", "hunter2").await;
        assert!(matches!(result, Err(UserServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn forgot_password_sends_a_usable_reset_link() {
        let mailer = Arc::new(RecordingMailer::default());
        let svc = service(mailer.clone());
        svc.signup("alice", "alice@example.com", "hunter2")
            .await
            .unwrap();

        svc.forgot_password("alice@example.com").await.unwrap();

        let sent = mailer.sent.lock().await;
        let (to, _, html) = &sent[0];
        assert_eq!(to, "alice@example.com");

        let token = html
            .split("/reset-password/")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .expect("reset link in email")
            .to_string();
        drop(sent);

        svc.reset_password(&token, "new-password").await.unwrap();
        assert!(svc.login("alice@example.com", "hunter2").await.is_err());
        assert!(svc.login("alice@example.com", "new-password").await.is_ok());
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_is_rejected() {
        let svc = service(Arc::new(RecordingMailer::default()));
        let result = svc.forgot_password("nobody@example.com").await;
        assert!(matches!(result, Err(UserServiceError::UnknownEmail)));
    }

    #[tokio::test]
    async fn session_token_cannot_reset_a_password() {
        let svc = service(Arc::new(RecordingMailer::default()));
        let signed_up = svc
            .signup("alice", "alice@example.com", "hunter2")
            .await
            .unwrap();

        let result = svc.reset_password(&signed_up.token, "new-password").await;
        assert!(matches!(result, Err(UserServiceError::InvalidResetToken)));
    }
}

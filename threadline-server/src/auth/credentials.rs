//! Opaque credential service: HMAC-SHA256 signed bearer tokens.
//!
//! Token format: `v1:{purpose}:{owner_id}:{expires_at_rfc3339}:{signature}`.
//! The signature covers everything before it; verification checks the
//! signature first, then the expiry, then that the purpose matches the one
//! the caller expects (a password-reset token must not open a session).

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature invalid")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token purpose mismatch")]
    WrongPurpose,
}

/// What a token authorizes its bearer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

impl TokenPurpose {
    fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::Session => "session",
            TokenPurpose::PasswordReset => "reset",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "session" => Some(TokenPurpose::Session),
            "reset" => Some(TokenPurpose::PasswordReset),
            _ => None,
        }
    }
}

/// Issues and verifies signed owner tokens. Cheap to clone; holds only the
/// signing secret.
#[derive(Clone)]
pub struct Credentials {
    secret: Vec<u8>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Issues a token for `owner_id` valid for `ttl`.
    #[must_use]
    pub fn issue(&self, owner_id: Uuid, purpose: TokenPurpose, ttl: Duration) -> String {
        let expires_at = (Utc::now() + ttl).to_rfc3339();
        let payload = format!("{TOKEN_VERSION}:{}:{owner_id}:{expires_at}", purpose.as_str());
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&payload));
        format!("{payload}:{signature}")
    }

    /// Verifies a token and returns the owner it names.
    ///
    /// # Errors
    /// Returns an error if the token is malformed, carries a bad signature,
    /// has expired, or was issued for a different purpose.
    pub fn verify(&self, raw: &str, expected: TokenPurpose) -> Result<Uuid, CredentialError> {
        // The RFC3339 expiry contains `:` itself, so the signature is peeled
        // off the right before the payload is split.
        let (payload, signature) = raw.rsplit_once(':').ok_or(CredentialError::Malformed)?;
        let parts: Vec<&str> = payload.splitn(4, ':').collect();
        let &[version, purpose, owner, expires_at] = parts.as_slice() else {
            return Err(CredentialError::Malformed);
        };

        if version != TOKEN_VERSION {
            return Err(CredentialError::Malformed);
        }

        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CredentialError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| CredentialError::BadSignature)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature_bytes)
            .map_err(|_| CredentialError::BadSignature)?;

        let expires = DateTime::parse_from_rfc3339(expires_at)
            .map_err(|_| CredentialError::Malformed)?
            .with_timezone(&Utc);
        if expires <= Utc::now() {
            return Err(CredentialError::Expired);
        }

        let purpose = TokenPurpose::parse(purpose).ok_or(CredentialError::Malformed)?;
        if purpose != expected {
            return Err(CredentialError::WrongPurpose);
        }

        Uuid::parse_str(owner).map_err(|_| CredentialError::Malformed)
    }

    fn sign(&self, payload: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("test-secret")
    }

    #[test]
    fn issued_token_verifies() {
        let owner = Uuid::new_v4();
        let token = credentials().issue(owner, TokenPurpose::Session, Duration::hours(1));
        let verified = credentials()
            .verify(&token, TokenPurpose::Session)
            .expect("token verifies");
        assert_eq!(verified, owner);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let owner = Uuid::new_v4();
        let token = credentials().issue(owner, TokenPurpose::Session, Duration::hours(1));
        let other = Uuid::new_v4();
        let tampered = token.replacen(&owner.to_string(), &other.to_string(), 1);
        assert_eq!(
            credentials().verify(&tampered, TokenPurpose::Session),
            Err(CredentialError::BadSignature)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token =
            credentials().issue(Uuid::new_v4(), TokenPurpose::Session, Duration::hours(1));
        assert_eq!(
            Credentials::new("other").verify(&token, TokenPurpose::Session),
            Err(CredentialError::BadSignature)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let token =
            credentials().issue(Uuid::new_v4(), TokenPurpose::Session, Duration::hours(-1));
        assert_eq!(
            credentials().verify(&token, TokenPurpose::Session),
            Err(CredentialError::Expired)
        );
    }

    #[test]
    fn reset_token_does_not_open_a_session() {
        let token =
            credentials().issue(Uuid::new_v4(), TokenPurpose::PasswordReset, Duration::hours(1));
        assert_eq!(
            credentials().verify(&token, TokenPurpose::Session),
            Err(CredentialError::WrongPurpose)
        );
        assert!(credentials().verify(&token, TokenPurpose::PasswordReset).is_ok());
    }

    #[test]
    fn expiry_colons_do_not_confuse_parsing() {
        let owner = Uuid::new_v4();
        let credentials = credentials();
        let token = credentials.issue(owner, TokenPurpose::Session, Duration::hours(1));
        // The RFC3339 expiry carries its own colons beyond the four field
        // separators.
        assert!(token.matches(':').count() > 4);
        assert_eq!(credentials.verify(&token, TokenPurpose::Session), Ok(owner));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            credentials().verify("not-a-token", TokenPurpose::Session),
            Err(CredentialError::Malformed)
        );
    }
}

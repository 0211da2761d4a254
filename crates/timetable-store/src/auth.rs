//! Credential verification in front of mutating operations.
//!
//! [`Authenticator`] is the seam; [`StaticCredentials`] checks against one
//! configured username/password pair. It gates the tool, nothing more.

use std::env;

use subtle::ConstantTimeEq;
use thiserror::Error;

pub const USER_ENV: &str = "TIMETABLE_ADMIN_USER";
pub const PASSWORD_ENV: &str = "TIMETABLE_ADMIN_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Proof of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication is not configured: {0} is not set")]
    NotConfigured(&'static str),
}

pub trait Authenticator: Send + Sync {
    fn verify(&self, credentials: &Credentials) -> Result<Session, AuthError>;
}

#[derive(Clone)]
pub struct StaticCredentials {
    expected: Credentials,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            expected: Credentials::new(username, password),
        }
    }

    /// Read the pair from `TIMETABLE_ADMIN_USER` and `TIMETABLE_ADMIN_PASSWORD`.
    pub fn from_env() -> Result<Self, AuthError> {
        let username = env::var(USER_ENV).map_err(|_| AuthError::NotConfigured(USER_ENV))?;
        let password = env::var(PASSWORD_ENV).map_err(|_| AuthError::NotConfigured(PASSWORD_ENV))?;
        Ok(Self::new(username, password))
    }
}

/// Constant-time over the common prefix; a length mismatch still fails.
fn same_secret(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    let min_len = expected.len().min(provided.len());
    let content_matches = expected[..min_len].ct_eq(&provided[..min_len]).unwrap_u8() == 1;
    expected.len() == provided.len() && content_matches
}

impl Authenticator for StaticCredentials {
    fn verify(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let user_ok = same_secret(&self.expected.username, &credentials.username);
        let password_ok = same_secret(&self.expected.password, &credentials.password);

        if !(user_ok && password_ok) {
            tracing::warn!(
                event = "invalid_login_attempt",
                username = %credentials.username,
                "Invalid login attempt"
            );
            return Err(AuthError::InvalidCredentials);
        }

        tracing::debug!(username = %credentials.username, "Login accepted");
        Ok(Session {
            username: credentials.username.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_configured_pair() {
        let auth = StaticCredentials::new("admin", "s3cret");
        let session = auth.verify(&Credentials::new("admin", "s3cret")).unwrap();
        assert_eq!(session.username, "admin");
    }

    #[test]
    fn rejects_wrong_password_or_user() {
        let auth = StaticCredentials::new("admin", "s3cret");
        assert_eq!(
            auth.verify(&Credentials::new("admin", "s3cret!")),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.verify(&Credentials::new("admin", "s3cre")),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.verify(&Credentials::new("root", "s3cret")),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let auth = StaticCredentials::new("admin", "s3cret");
        assert!(auth.verify(&Credentials::new("", "")).is_err());
    }
}

use crate::security::SecretString;
use crate::session::{Identity, SessionToken};

/// Email + password proof, optionally attaching the device push token.
#[derive(Debug)]
pub struct PasswordCredentials {
    pub email: String,
    pub password: SecretString,
    pub push_token: Option<String>,
}

impl PasswordCredentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
            push_token: None,
        }
    }

    pub fn with_push_token(mut self, push_token: impl Into<String>) -> Self {
        self.push_token = Some(push_token.into());
        self
    }
}

/// Fields collected by the sign-up screen.
#[derive(Debug)]
pub struct RegistrationForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: SecretString,
}

/// What every verifier hands back on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: SessionToken,
    pub identity: Identity,
}

/// Backend-issued reset token carried from code verification to the
/// new-password step.
#[derive(Debug)]
pub struct ResetTicket {
    pub email: String,
    pub token: SecretString,
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::session::identity::Identity;

/// Opaque backend-issued session token.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown theme preference: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for ThemePreference {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

/// The authenticated-identity record held client-side.
///
/// A token is present exactly when an identity is present; the constructors
/// are the only way to build one, so that pairing cannot be broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<SessionToken>,
    identity: Option<Identity>,
    theme: ThemePreference,
    onboarding_complete: bool,
}

impl Session {
    pub fn signed_out(theme: ThemePreference) -> Self {
        Self {
            token: None,
            identity: None,
            theme,
            onboarding_complete: false,
        }
    }

    pub fn signed_in(
        token: SessionToken,
        identity: Identity,
        theme: ThemePreference,
        onboarding_complete: bool,
    ) -> Self {
        Self {
            token: Some(token),
            identity: Some(identity),
            theme,
            onboarding_complete,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|identity| &identity.id)
    }

    pub fn theme(&self) -> ThemePreference {
        self.theme
    }

    pub fn onboarding_complete(&self) -> bool {
        self.onboarding_complete
    }

    /// Signed in and through onboarding: protected actions may run.
    pub fn is_ready(&self) -> bool {
        self.is_signed_in() && self.onboarding_complete
    }

    pub fn with_theme(mut self, theme: ThemePreference) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_onboarding_complete(mut self, value: bool) -> Self {
        self.onboarding_complete = value;
        self
    }

    /// Swap the identity of a signed-in session. No-op when signed out.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        if self.token.is_some() {
            self.identity = Some(identity);
        }
        self
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::signed_out(ThemePreference::default())
    }
}
